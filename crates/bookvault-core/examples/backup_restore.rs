//! Round-trip demo: build a small catalogue, back it up, wipe it, restore it

use bookvault_core::{
    Book, BookStore, ContainerFormat, ExportHelper, ImportHelper, MemoryCatalogue, NullListener,
    PreferenceStore, Updates,
};

fn main() -> bookvault_core::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let dir = std::env::temp_dir().join("bookvault-demo");
    std::fs::create_dir_all(&dir)?;
    let archive = dir.join("backup.tar");

    println!("=== Catalogue Backup/Restore Demo ===\n");

    // Build a small catalogue
    let mut catalogue = MemoryCatalogue::new();
    catalogue.put_book(
        Book::new("Dune")
            .with_author("Frank Herbert")
            .with_isbn("9780441172719"),
    );
    catalogue.put_book(Book::new("Hyperion").with_author("Dan Simmons"));
    catalogue.put_book(
        Book::new("Good Omens")
            .with_author("Terry Pratchett")
            .with_author("Neil Gaiman"),
    );
    catalogue.preferences_mut().set("list.sort", "author");
    println!("Catalogue holds {} books", catalogue.all_books()?.len());

    // Back it up
    println!("\n--- Export ---");
    let exported = ExportHelper::new(&archive, ContainerFormat::Tar)
        .write(&catalogue, &NullListener)?;
    println!(
        "Exported {} books to {}",
        exported.book_count,
        archive.display()
    );

    // Inspect the header before restoring
    println!("\n--- Peek ---");
    let helper = ImportHelper::new(&archive, ContainerFormat::Tar);
    if let Some(meta) = helper.read_meta_data()? {
        println!(
            "Archive v{} written {}, {} books",
            meta.version,
            meta.created,
            meta.book_count.unwrap_or(0)
        );
    }

    // Restore into a fresh catalogue
    println!("\n--- Import ---");
    let mut restored = MemoryCatalogue::new();
    let imported = helper
        .with_updates(Updates::Skip)
        .read(&mut restored, &NullListener)?;
    println!(
        "Created {}, updated {}, skipped {}",
        imported.books_created, imported.books_updated, imported.books_skipped
    );
    println!(
        "Restored catalogue holds {} books, sort preference = {:?}",
        restored.all_books()?.len(),
        restored.preferences()?.get("list.sort")
    );

    Ok(())
}
