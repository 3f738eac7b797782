//! # relaymail-mime
//!
//! MIME generation primitives for relaymail's outbound messages.
//!
//! ## Features
//!
//! - **Ordered headers**: case-insensitive lookup, insertion-ordered output
//! - **Content types**: parameterized `type/subtype` values
//! - **Encoding**: Base64 (76-column wrapped) and Quoted-Printable
//! - **Multipart**: `multipart/mixed` bodies with per-call unique boundaries
//!
//! ## Quick Start
//!
//! ```ignore
//! use relaymail_mime::{Headers, MultipartWriter, Part};
//!
//! let mut body = MultipartWriter::new();
//! body.add_part(Part::text_quoted_printable("See attached log."))
//!     .add_part(Part::attachment_base64("export.adi", adif.as_bytes()));
//!
//! let mut headers = Headers::new();
//! headers.add("MIME-Version", "1.0");
//! headers.add("Content-Type", body.content_type().to_string());
//!
//! let message = format!("{headers}\r\n{}", body.finish());
//! ```
//!
//! ### Encoding
//!
//! ```ignore
//! use relaymail_mime::encoding::{encode_base64_wrapped, encode_quoted_printable};
//!
//! let qp = encode_quoted_printable("Héllo, Wørld!");
//! let b64 = encode_base64_wrapped(b"attachment bytes");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod multipart;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::{Headers, format_date};
pub use multipart::{MultipartWriter, Part, TransferEncoding, generate_boundary};
