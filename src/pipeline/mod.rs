//! Pipeline stages for document-to-thread conversion.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ dedup ──▶ render/encode ──▶ compose
//! (HTTP)    (MARCXML)   (ledger)  (pdfium, JPEG)    (post units)
//!                                    docx ─┘  chunk ─┘
//! ```
//!
//! 1. [`fetch`]   — blocking HTTP against the library and document system
//! 2. [`extract`] — MARCXML → [`Record`](crate::Record),
//!    [`VoteRecord`](crate::VoteRecord), [`DraftResolution`](crate::DraftResolution)
//! 3. [`dedup`]   — choose the oldest record not yet posted
//! 4. [`render`]  — rasterise preview pages; [`encode`] keeps each JPEG
//!    under the upload ceiling
//! 5. [`docx`]    — the "Summary" table of a Word rendition
//! 6. [`chunk`]   — split prose into post-sized pieces
//! 7. [`compose`] — assemble the thread

pub mod chunk;
pub mod compose;
pub mod dedup;
pub mod docx;
pub mod encode;
pub mod extract;
pub mod fetch;
pub mod render;
