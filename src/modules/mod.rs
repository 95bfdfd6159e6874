pub mod authors;
pub mod books;
pub mod catalog;
pub mod openapi;

use libris_kernel::ModuleRegistry;

use catalog::Catalog;

/// Register all project-specific modules, sharing one catalog between them
pub fn register_all(registry: &mut ModuleRegistry, catalog: &Catalog) -> anyhow::Result<()> {
    registry.register(authors::create_module(catalog.clone()))?;
    registry.register(books::create_module(catalog.clone()))?;
    Ok(())
}
