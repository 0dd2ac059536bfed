//! # Host Uploads
//!
//! Pixel data streamed through the 2D engine's immediate-data (SIFC) path.
//! Each row goes out as one or more non-incrementing data commands of at
//! most `sifc_max_words` dwords. Rows are reserved whole, so a flush can
//! only fall between rows; the replayed setup then restarts the transfer
//! geometry at the first row not yet sent.

use nv50_cmd::{PushDevice, MAX_COUNT};
use nv50_core::{Error, Rect, Result, Surface};

use crate::binder::{Role2d, BIND_2D_RELOCS, BIND_2D_WORDS};
use crate::hw::{twod, SUBC_2D};
use crate::pending::{fallback, transaction, Channel, Env, OperationKind, PendingOperation};

/// Everything needed to replay an upload setup, plus transfer progress
#[derive(Debug, Clone, Copy)]
pub struct UploadState {
    env: Env,
    dst: Surface,
    rect: Rect,
    cpp: u32,
    format: u32,
    rows_done: u32,
}

impl UploadState {
    /// Reservation for the setup
    pub const SETUP_WORDS: usize = 64;
    /// Relocations the setup emits
    pub const SETUP_RELOCS: usize = BIND_2D_RELOCS;

    /// Validate an upload of `rect` into `dst` at `cpp` bytes per pixel
    pub fn new(env: Env, dst: Surface, rect: Rect, cpp: u32) -> Result<Self> {
        let format = env.binder.caps().surface_2d_format(dst.depth)?;
        if !(1..=4).contains(&cpp) {
            return Err(Error::UnsupportedFormat);
        }
        Ok(Self {
            env,
            dst,
            rect,
            cpp,
            format,
            rows_done: 0,
        })
    }

    /// Bytes of pixel data per row
    pub fn row_bytes(&self) -> usize {
        self.rect.width.max(0) as usize * self.cpp as usize
    }

    /// Dwords per row, the last one padded
    pub fn line_dwords(&self) -> usize {
        self.row_bytes().div_ceil(4)
    }

    /// Data commands per row
    pub fn chunks_per_row(&self) -> usize {
        self.line_dwords().div_ceil(self.env.sifc_max_words)
    }

    /// Words one row occupies in the ring, headers included
    pub fn row_words(&self) -> usize {
        self.line_dwords() + self.chunks_per_row()
    }

    /// Total rows
    pub fn rows(&self) -> u32 {
        self.rect.height.max(0) as u32
    }

    /// Rows already in the ring
    pub fn rows_done(&self) -> u32 {
        self.rows_done
    }

    /// Whether every row has been sent
    pub fn is_complete(&self) -> bool {
        self.rows_done >= self.rows()
    }

    /// Bind and clip the destination and start a transfer of the rows not
    /// yet sent
    pub(crate) fn setup<D: PushDevice>(&self, chan: &mut Channel<D>) -> Result<()> {
        // The clip hides the padding at the end of rows that aren't a whole
        // number of dwords.
        let clip = Some(self.rect);
        self.env
            .binder
            .bind_2d(chan, &self.dst, Role2d::Destination { clip })?;

        chan.method(SUBC_2D, twod::OPERATION, 1);
        chan.emit(twod::OPERATION_SRCCOPY);
        chan.set_cached_rop(None);

        chan.method(SUBC_2D, twod::SIFC_BITMAP_ENABLE, 2);
        chan.emit(0);
        chan.emit(self.format);

        chan.method(SUBC_2D, twod::SIFC_WIDTH, 10);
        chan.emit((self.line_dwords() * 4) as u32 / self.cpp);
        chan.emit(self.rows() - self.rows_done);
        chan.emit_block(&[0, 1, 0, 1, 0]);
        chan.emit(self.rect.x as u32);
        chan.emit(0);
        chan.emit((self.rect.y as u32).wrapping_add(self.rows_done));
        Ok(())
    }
}

static_assertions::const_assert!(BIND_2D_WORDS + 2 + 3 + 11 <= UploadState::SETUP_WORDS);

pub(crate) fn prepare<D: PushDevice>(
    chan: &mut Channel<D>,
    env: Env,
    dst: &Surface,
    rect: Rect,
    cpp: u32,
) -> Result<()> {
    let state = UploadState::new(env, *dst, rect, cpp).map_err(|e| fallback(OperationKind::Upload, e))?;

    if state.row_words() + UploadState::SETUP_WORDS > chan.capacity() {
        return Err(fallback(OperationKind::Upload, Error::RingExhausted));
    }

    transaction(
        chan,
        UploadState::SETUP_WORDS,
        UploadState::SETUP_RELOCS,
        OperationKind::Upload,
        |chan| state.setup(chan),
    )?;

    chan.registry_mut().arm(PendingOperation::Upload(state));
    Ok(())
}

/// Stream the next rows of the prepared upload
///
/// Rows beyond the prepared height are ignored. Each row must hold at least
/// the prepared width in pixels.
pub(crate) fn execute<'r, D, I>(chan: &mut Channel<D>, rows: I) -> Result<()>
where
    D: PushDevice,
    I: IntoIterator<Item = &'r [u8]>,
{
    for row in rows {
        let state = match chan.registry().get() {
            Some(PendingOperation::Upload(state)) => *state,
            _ => panic!("upload rows sent without a prepared upload"),
        };
        if state.is_complete() {
            log::warn!("upload: rows past height {} ignored", state.rows());
            break;
        }

        assert!(
            row.len() >= state.row_bytes(),
            "upload row of {} bytes, need {}",
            row.len(),
            state.row_bytes()
        );
        let bytes = &row[..state.row_bytes()];

        let _ = chan.reserve(state.row_words(), 0)?;
        for chunk in bytes.chunks(state.env.sifc_max_words * 4) {
            chan.method_ni(SUBC_2D, twod::SIFC_DATA, chunk.len().div_ceil(4) as u32);
            for word in chunk.chunks(4) {
                chan.emit(pack_dword(word));
            }
        }

        if let Some(PendingOperation::Upload(state)) = chan.registry_mut().get_mut() {
            state.rows_done += 1;
        }
    }

    let complete = matches!(
        chan.registry().get(),
        Some(PendingOperation::Upload(state)) if state.is_complete()
    );
    if complete {
        // Nothing left that a flush would need to set up again.
        chan.registry_mut().disarm();
    }
    Ok(())
}

/// Host-order dword from up to four bytes, zero padded
fn pack_dword(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word[..bytes.len()].copy_from_slice(bytes);
    bytemuck::pod_read_unaligned(&word)
}

static_assertions::const_assert!(1792 <= MAX_COUNT);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Binder;
    use crate::caps::Capabilities;
    use nv50_core::BufferHandle;

    fn env(max: usize) -> Env {
        Env {
            binder: Binder::new(Capabilities::for_chipset(0x50).unwrap(), BufferHandle::new(1)),
            kick_threshold: 512,
            sifc_max_words: max,
        }
    }

    #[test]
    fn test_row_geometry() {
        let dst = Surface::tiled(4096, 16, 32, BufferHandle::new(2), 0);
        let s = UploadState::new(env(1792), dst, Rect::new(0, 0, 4000, 2), 4).unwrap();
        assert_eq!(s.line_dwords(), 4000);
        assert_eq!(s.chunks_per_row(), 3);
        assert_eq!(s.row_words(), 4003);
    }

    #[test]
    fn test_padded_row() {
        let dst = Surface::tiled(64, 16, 8, BufferHandle::new(2), 0);
        let s = UploadState::new(env(1792), dst, Rect::new(0, 0, 5, 1), 1).unwrap();
        assert_eq!(s.row_bytes(), 5);
        assert_eq!(s.line_dwords(), 2);
    }

    #[test]
    fn test_bad_cpp() {
        let dst = Surface::tiled(64, 16, 32, BufferHandle::new(2), 0);
        assert_eq!(
            UploadState::new(env(1792), dst, Rect::new(0, 0, 5, 1), 3).map(|_| ()),
            Ok(())
        );
        assert_eq!(
            UploadState::new(env(1792), dst, Rect::new(0, 0, 5, 1), 5).map(|_| ()),
            Err(Error::UnsupportedFormat)
        );
    }

    #[test]
    fn test_pack_dword_pads() {
        assert_eq!(pack_dword(&[1, 2, 3, 4]), u32::from_ne_bytes([1, 2, 3, 4]));
        assert_eq!(pack_dword(&[9]), u32::from_ne_bytes([9, 0, 0, 0]));
    }
}
