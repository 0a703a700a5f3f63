//! # Playback Module
//!
//! Secuenciación de reproducción por sesión.
//!
//! Cada guild tiene una sesión independiente: una cola FIFO y un único
//! runner que la consume. Los productores (un task por petición entrante)
//! sólo encolan lotes o disparan la señal de cancelación; nunca esperan a
//! la reproducción. El runner espera la descarga del track al frente,
//! lo arranca en el transporte de voz y corre la carrera entre el fin
//! natural y un cancel externo (skip o stop-con-vaciado).
//!
//! El transporte de voz queda detrás de [`transport::Transport`] para que
//! el runner sea comprobable sin una conexión real de Discord.

pub mod player;
pub mod queue;
pub mod session;
pub mod transport;
