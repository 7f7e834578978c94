//! Built-in pipes.
//!
//! | Pipe | Kind | Added by |
//! |------|------|----------|
//! | [`BindArguments`] | input | the assembler, first input of every pipeline |
//! | [`CodecDecode`] | input | the `codec` capability |
//! | [`InjectContentType`] | output | the `produces` capability |
//! | [`CodecEncode`] | output | the `codec` capability |
//! | [`DropHeadBody`] | output | the assembler, last output of every pipeline |

mod binding;
mod codec;
mod content_type;
mod head;

pub use binding::BindArguments;
pub use codec::{CodecDecode, CodecEncode};
pub use content_type::InjectContentType;
pub use head::DropHeadBody;
