pub mod backend;
pub mod fonts;
pub mod graphics;
pub mod page;
pub mod text;
