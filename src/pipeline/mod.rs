//! Pipeline stages for one document round trip.
//!
//! Each submodule implements exactly one step. The controller strings them
//! together and owns all state; the stages themselves hold none beyond what
//! their types carry.
//!
//! ## Data Flow
//!
//! ```text
//! select ──▶ transport ──▶ decode ──▶ download
//! (.docx)    (multipart)   (JSON +    (blob handle →
//!                           base64)    saved file)
//! ```
//!
//! 1. [`select`]    — accept or reject a candidate by its file-name suffix
//! 2. [`transport`] — one multipart POST; the only stage with network I/O
//! 3. [`decode`]    — split the success body into preview HTML and document
//!    bytes
//! 4. [`download`]  — expose the bytes under a revocable handle and save them
//!    through a pluggable surface

pub mod decode;
pub mod download;
pub mod select;
pub mod transport;
