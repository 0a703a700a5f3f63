use thiserror::Error;

/// Fallos reportables al usuario durante la preparación o reproducción de un
/// track. Los dos primeros son por-elemento y nunca detienen la cola; `Join`
/// aborta el lote actual completo.
#[derive(Debug, Error)]
pub enum PlayError {
    #[error("no se pudo resolver la fuente: {0}")]
    Resolution(String),

    #[error("fallo de descarga o transcodificación: {0}")]
    Transcode(String),

    #[error("no se pudo entrar al canal de voz: {0}")]
    Join(String),

    #[error("la petición no produjo ningún track reproducible")]
    EmptyResult,
}
