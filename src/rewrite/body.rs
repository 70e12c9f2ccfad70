//! In-memory response body for rewritten content.

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A finite body backed by a single buffer.
///
/// The buffer is yielded as one data frame and the body then ends. Nothing
/// outside the buffer is held, so dropping it releases everything.
#[derive(Debug, Clone, Default)]
pub struct BufferBody {
    data: Option<Bytes>,
}

impl BufferBody {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            data: (!data.is_empty()).then_some(data),
        }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.as_ref().map_or(0, Bytes::len)
    }
}

impl Body for BufferBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.data.take().map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining() as u64)
    }
}
