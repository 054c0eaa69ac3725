//! Completed frames and the hand-off to whoever presents them.
//!
//! The emulator produces exactly one frame per vertical cycle. Presentation
//! is allowed to fall behind: the channel holds at most one pending frame and
//! a frame published while another is still pending is dropped. Buffers go
//! back to the producer through a return channel, so a running session
//! allocates no frames once the pool is warm.

use crossbeam_channel as cb;

pub use crossbeam_channel::TryRecvError;

use crate::{Color, SCREEN_HEIGHT, SCREEN_WIDTH};

/// One composited 160x144 RGB frame, row-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FrameBuffer {
    pixels: Box<[Color]>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            pixels: vec![Color::WHITE; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice(),
        }
    }
}

impl FrameBuffer {
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[y * SCREEN_WIDTH + x] = color;
    }

    pub fn copy_from(&mut self, other: &FrameBuffer) {
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// Copy the frame into `buffer` as packed RGB24.
    ///
    /// Extra space in `buffer` is left untouched; a short buffer receives as
    /// many whole pixels as fit.
    pub fn write_rgb24(&self, buffer: &mut [u8]) {
        for (dst, color) in buffer.chunks_exact_mut(3).zip(self.pixels.iter()) {
            dst[0] = color.r;
            dst[1] = color.g;
            dst[2] = color.b;
        }
    }

    pub fn to_rgb24(&self) -> Vec<u8> {
        let mut out = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT * 3];
        self.write_rgb24(&mut out);
        out
    }
}

/// Presentation sink invoked once per completed vertical cycle.
pub trait Screen {
    fn draw_frame(&mut self, frame: &FrameBuffer);
}

/// Sink that discards every frame.
#[derive(Default, Debug)]
pub struct NullScreen;

impl Screen for NullScreen {
    fn draw_frame(&mut self, _frame: &FrameBuffer) {}
}

/// Most buffers ever in flight: one being filled, one pending and one held
/// by the consumer.
const FRAME_POOL: usize = 3;

/// Producer half of the frame hand-off.
pub struct FrameSender {
    tx: cb::Sender<FrameBuffer>,
    recycled: cb::Receiver<FrameBuffer>,
    spare: Option<FrameBuffer>,
    allocated: usize,
    dropped: u64,
}

/// Consumer half of the frame hand-off.
pub struct FrameReceiver {
    rx: cb::Receiver<FrameBuffer>,
    recycle: cb::Sender<FrameBuffer>,
}

/// Create a single-slot frame hand-off.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let (tx, rx) = cb::bounded(1);
    let (recycle, recycled) = cb::bounded(FRAME_POOL);
    (
        FrameSender {
            tx,
            recycled,
            spare: None,
            allocated: 0,
            dropped: 0,
        },
        FrameReceiver { rx, recycle },
    )
}

impl FrameSender {
    /// Number of frames discarded because the consumer had not yet taken the
    /// previous one (or has gone away).
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn free_buffer(&mut self) -> Option<FrameBuffer> {
        if let Some(buffer) = self.spare.take() {
            return Some(buffer);
        }
        if let Ok(buffer) = self.recycled.try_recv() {
            return Some(buffer);
        }
        if self.allocated < FRAME_POOL {
            self.allocated += 1;
            return Some(FrameBuffer::default());
        }
        None
    }
}

impl Screen for FrameSender {
    fn draw_frame(&mut self, frame: &FrameBuffer) {
        if self.tx.is_full() {
            self.dropped = self.dropped.wrapping_add(1);
            log::trace!("frame hand-off full, dropping frame");
            return;
        }
        let Some(mut buffer) = self.free_buffer() else {
            self.dropped = self.dropped.wrapping_add(1);
            log::trace!("every frame buffer is held by the consumer, dropping frame");
            return;
        };
        buffer.copy_from(frame);
        match self.tx.try_send(buffer) {
            Ok(()) => {}
            Err(cb::TrySendError::Full(buffer)) => {
                self.spare = Some(buffer);
                self.dropped = self.dropped.wrapping_add(1);
                log::trace!("frame hand-off full, dropping frame");
            }
            Err(cb::TrySendError::Disconnected(buffer)) => {
                self.spare = Some(buffer);
                self.dropped = self.dropped.wrapping_add(1);
            }
        }
    }
}

impl FrameReceiver {
    /// Block until the next frame arrives. Returns `None` once the producer
    /// has been dropped.
    pub fn recv(&self) -> Option<FrameBuffer> {
        self.rx.recv().ok()
    }

    /// Take the pending frame without blocking.
    pub fn try_recv(&self) -> Result<FrameBuffer, TryRecvError> {
        self.rx.try_recv()
    }

    /// Hand a presented frame back to the producer for reuse.
    pub fn recycle(&self, frame: FrameBuffer) {
        if self.recycle.try_send(frame).is_err() {
            log::trace!("producer gone, releasing frame buffer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(x: usize) -> FrameBuffer {
        let mut frame = FrameBuffer::default();
        frame.set_pixel(x, 0, Color::BLACK);
        frame
    }

    #[test]
    fn pending_frame_is_not_replaced_and_extra_frames_are_counted() {
        let (mut tx, rx) = frame_channel();

        tx.draw_frame(&marked(0));
        tx.draw_frame(&FrameBuffer::default());

        assert_eq!(tx.dropped(), 1);
        let got = rx.try_recv().unwrap();
        assert_eq!(got.pixel(0, 0), Color::BLACK);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn receiver_sees_disconnect_after_sender_drops() {
        let (tx, rx) = frame_channel();
        drop(tx);
        assert!(rx.recv().is_none());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn recycled_buffers_are_reused() {
        let (mut tx, rx) = frame_channel();
        for x in 0..10 {
            tx.draw_frame(&marked(x));
            let frame = rx.recv().unwrap();
            assert_eq!(frame.pixel(x, 0), Color::BLACK);
            rx.recycle(frame);
        }
        assert_eq!(tx.allocated, 1);
        assert_eq!(tx.dropped(), 0);
    }

    #[test]
    fn frames_are_dropped_once_the_consumer_holds_every_buffer() {
        let (mut tx, rx) = frame_channel();
        let mut held = Vec::new();
        for x in 0..FRAME_POOL {
            tx.draw_frame(&marked(x));
            held.push(rx.recv().unwrap());
        }
        tx.draw_frame(&marked(5));
        assert_eq!(tx.allocated, FRAME_POOL);
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        rx.recycle(held.remove(0));
        tx.draw_frame(&marked(6));
        assert_eq!(rx.try_recv().unwrap().pixel(6, 0), Color::BLACK);
        assert_eq!(tx.allocated, FRAME_POOL);
    }

    #[test]
    fn rgb24_export_packs_three_bytes_per_pixel() {
        let mut frame = FrameBuffer::default();
        frame.set_pixel(1, 0, Color::new_rgb(1, 2, 3));
        let bytes = frame.to_rgb24();
        assert_eq!(bytes.len(), SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        assert_eq!(&bytes[0..6], &[0xFF, 0xFF, 0xFF, 1, 2, 3]);
    }
}
