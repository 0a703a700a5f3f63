//! # Fetch Module
//!
//! Preparación de assets: resolución de fuentes, descarga serializada y
//! caché en disco.
//!
//! - [`cache`] — direccionamiento `(fuente, id)` → archivo y comprobación
//!   de existencia; visibilidad todo-o-nada.
//! - [`fetcher`] — resolvedor + descarga HTTP + transcodificación externa,
//!   con publicación atómica en el caché.
//! - [`pipeline`] — cola FIFO con un único worker: nunca hay dos descargas
//!   en vuelo y el fallo de una no arrastra a las demás.
//!
//! El caché y el pipeline son únicos en el proceso y los comparten todas
//! las sesiones de reproducción.

pub mod cache;
pub mod fetcher;
pub mod pipeline;

pub use cache::{AssetCache, AssetHandle, AssetKey};
pub use fetcher::{AssetFetcher, Fetcher};
pub use pipeline::{DownloadHandle, DownloadPipeline};
