//! Whole-pipeline scenarios against the recording device.

use alloc::vec;
use alloc::vec::Vec;

use nv50_cmd::mock::MockDevice;
use nv50_cmd::{Header, RelocFlags, RingConfig, Subchannel};
use nv50_core::{BufferHandle, ByteSize, Error, GpuAddr, PictFormat, Picture, Point, Rect, Surface};

use crate::blend::BlendFactor;
use crate::hw::{tesla, twod, SUBC_2D, SUBC_3D};
use crate::{Accel, ExaConfig, PictOp, RasterOp};

const SCRATCH: u64 = 1;
const VRAM: u64 = 2;

fn device() -> MockDevice {
    MockDevice::new()
        .consuming()
        .with_buffer(SCRATCH, GpuAddr::new(0x10_0000))
        .with_buffer(VRAM, GpuAddr::new(0x4000_0000))
}

fn accel_on(device: MockDevice, ring: RingConfig) -> Accel<MockDevice> {
    let config = ExaConfig {
        ring,
        scratch: BufferHandle::new(SCRATCH),
        ..ExaConfig::default()
    };
    Accel::new(0x84, config, device).unwrap()
}

fn accel_with(ring: RingConfig) -> Accel<MockDevice> {
    accel_on(device(), ring)
}

fn accel() -> Accel<MockDevice> {
    accel_with(RingConfig::default())
}

fn surface(width: u32, height: u32, depth: u8) -> Surface {
    Surface::tiled(width, height, depth, BufferHandle::new(VRAM), 0)
}

fn header(subc: Subchannel, method: u32, count: u32) -> u32 {
    Header::new(subc, method, count).encode()
}

fn positions(words: &[u32], header: u32) -> Vec<usize> {
    words
        .iter()
        .enumerate()
        .filter(|(_, w)| **w == header)
        .map(|(i, _)| i)
        .collect()
}

/// Payload following the first occurrence of `header`
fn payload(words: &[u32], header: u32) -> &[u32] {
    let at = positions(words, header)[0];
    let count = Header::decode(header).count as usize;
    &words[at + 1..at + 1 + count]
}

#[test]
fn test_composite_over_large_rect() {
    let mut accel = accel();
    let src = Picture::new(surface(100, 100, 32), PictFormat::X8R8G8B8);
    let dst = Picture::new(surface(200, 200, 32), PictFormat::A8R8G8B8);

    accel.prepare_composite(PictOp::Over, &src, None, &dst).unwrap();
    let setup = accel.channel().cursor();
    assert_eq!(
        accel
            .channel()
            .registry()
            .get()
            .map(|op| match op {
                crate::PendingOperation::Composite(state) => state.context().units.len(),
                _ => 0,
            }),
        Some(1)
    );

    accel
        .execute_composite(Point::ZERO, Point::ZERO, Rect::new(0, 0, 100, 100))
        .unwrap();
    assert_eq!(accel.channel().device().kicks(), 1);

    let batch = &accel.channel().device().submitted()[0];
    assert_eq!(payload(batch, header(SUBC_3D, tesla::BLEND_ENABLE0, 1)), &[1]);
    assert_eq!(
        payload(batch, header(SUBC_3D, tesla::BLEND_EQUATION_RGB, 5)),
        &[
            tesla::BLEND_FUNC_ADD,
            BlendFactor::One.hw(),
            BlendFactor::OneMinusSrcAlpha.hw(),
            tesla::BLEND_FUNC_ADD,
            BlendFactor::One.hw(),
        ]
    );
    assert_eq!(
        payload(batch, header(SUBC_3D, tesla::VERTEX_BEGIN, 1)),
        &[tesla::PRIM_TRIANGLE_FAN]
    );
    // One texture unit: two coordinates per vertex, four vertices.
    assert_eq!(positions(batch, header(SUBC_3D, tesla::VTX_ATTR_2F_X8, 2)).len(), 4);
    assert_eq!(
        payload(batch, header(SUBC_3D, tesla::SCISSOR_HORIZ0, 2)),
        &[100 << 16, 100 << 16]
    );

    // The kick flushed; the whole setup is already back at the head of the
    // next batch and goes out word for word.
    assert_eq!(accel.channel().cursor(), setup);
    accel.flush().unwrap();
    let submitted = accel.channel().device().submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(&submitted[1][..], &submitted[0][..setup]);
    assert_eq!(submitted[1][0], header(SUBC_2D, twod::SERIALIZE, 1));
    accel.done();
}

#[test]
fn test_many_operations_share_relocation_table() {
    let mut accel = accel();
    let p = Picture::new(surface(64, 64, 32), PictFormat::A8R8G8B8);
    let dst = surface(64, 64, 32);

    for _ in 0..100 {
        accel.prepare_composite(PictOp::Src, &p, None, &p).unwrap();
        accel
            .execute_composite(Point::ZERO, Point::ZERO, Rect::new(0, 0, 4, 4))
            .unwrap();
        accel.done();
    }
    for _ in 0..600 {
        accel.prepare_solid(&dst, RasterOp::COPY, !0, 0).unwrap();
        accel.done();
    }
    accel.flush().unwrap();

    // 16 relocations per single-unit composite, 2 per fill, 1024 per batch
    let device = accel.channel().device();
    assert_eq!(device.relocations().len(), 100 * 16 + 600 * 2);
    assert!(device.submitted().len() >= 3);
    assert_eq!(accel.stats().replays, 0);
}

#[test]
fn test_relocations_carry_access_flags() {
    const TARGET: u64 = 3;
    let device = device().with_buffer(TARGET, GpuAddr::new(0x8000_0000));
    let mut accel = accel_on(device, RingConfig::default());
    let src = Picture::new(surface(64, 64, 32), PictFormat::A8R8G8B8);
    let dst = Picture::new(
        Surface::tiled(64, 64, 32, BufferHandle::new(TARGET), 0),
        PictFormat::A8R8G8B8,
    );

    accel.prepare_composite(PictOp::Over, &src, None, &dst).unwrap();
    accel.done();
    accel.flush().unwrap();

    let relocs = accel.channel().device().relocations();
    let flags_of = |id: u64| -> Vec<RelocFlags> {
        relocs
            .iter()
            .filter(|(bo, _)| bo.id() == id)
            .map(|(_, flags)| *flags)
            .collect()
    };
    assert_eq!(flags_of(TARGET), vec![RelocFlags::VRAM | RelocFlags::WRITE; 2]);
    assert_eq!(flags_of(VRAM), vec![RelocFlags::VRAM | RelocFlags::READ; 2]);
    assert!(flags_of(SCRATCH)
        .iter()
        .all(|flags| flags.contains(RelocFlags::VRAM | RelocFlags::READ)));
}

#[test]
fn test_small_composite_does_not_kick() {
    let mut accel = accel();
    let p = Picture::new(surface(64, 64, 32), PictFormat::A8R8G8B8);
    accel.prepare_composite(PictOp::Src, &p, None, &p).unwrap();
    accel
        .execute_composite(Point::ZERO, Point::ZERO, Rect::new(0, 0, 8, 8))
        .unwrap();
    assert_eq!(accel.channel().device().kicks(), 0);
    assert_eq!(
        payload(accel.channel().batch(), header(SUBC_3D, tesla::BLEND_ENABLE0, 1)),
        &[0]
    );
    accel.done();
}

#[test]
fn test_composite_with_mask_binds_two_units() {
    let mut accel = accel();
    let src = Picture::new(surface(64, 64, 32), PictFormat::A8R8G8B8);
    let mask = Picture::new(surface(64, 64, 8), PictFormat::A8);
    let dst = Picture::new(surface(64, 64, 32), PictFormat::X8R8G8B8);

    accel.prepare_composite(PictOp::Over, &src, Some(&mask), &dst).unwrap();
    accel
        .execute_composite(Point::ZERO, Point::new(4, 4), Rect::new(0, 0, 8, 8))
        .unwrap();
    let batch = accel.channel().batch();
    assert_eq!(positions(batch, header(SUBC_3D, tesla::VTX_ATTR_2F_X8, 4)).len(), 4);
    assert_eq!(positions(batch, header(SUBC_3D, tesla::TIC_ADDRESS_HIGH, 3)).len(), 2);
    accel.done();
}

#[test]
fn test_rop_state_cached_within_batch() {
    let mut accel = accel();
    let dst = surface(128, 128, 24);
    let rop = header(SUBC_2D, twod::ROP, 1);

    accel.prepare_solid(&dst, RasterOp::XOR, !0, 0x123456).unwrap();
    accel.execute_solid(Rect::new(0, 0, 4, 4)).unwrap();
    accel.done();
    accel.prepare_solid(&dst, RasterOp::XOR, !0, 0x654321).unwrap();
    accel.done();
    assert_eq!(positions(accel.channel().batch(), rop).len(), 1);

    // A different op is not covered by the cache.
    accel.prepare_solid(&dst, RasterOp::OR, !0, 0).unwrap();
    accel.done();
    assert_eq!(positions(accel.channel().batch(), rop).len(), 2);

    // Nor does the cache outlive the batch.
    accel.flush().unwrap();
    accel.prepare_solid(&dst, RasterOp::OR, !0, 0).unwrap();
    accel.done();
    assert_eq!(positions(accel.channel().batch(), rop).len(), 1);
}

#[test]
fn test_solid_kicks_at_threshold() {
    let mut accel = accel();
    accel.prepare_solid(&surface(64, 64, 32), RasterOp::COPY, !0, 0).unwrap();
    accel.execute_solid(Rect::new(0, 0, 31, 16)).unwrap();
    assert_eq!(accel.channel().device().kicks(), 0);
    accel.execute_solid(Rect::new(0, 0, 32, 16)).unwrap();
    assert_eq!(accel.channel().device().kicks(), 1);
    accel.done();
}

#[test]
fn test_copy_blit_words() {
    let mut accel = accel();
    let s = surface(64, 64, 16);
    accel.prepare_copy(&s, &s, RasterOp::COPY, !0).unwrap();
    accel.execute_copy(Rect::new(1, 2, 3, 4), Point::new(5, 6)).unwrap();
    assert_eq!(
        payload(accel.channel().batch(), header(SUBC_2D, twod::BLIT_DST_X, 12)),
        &[5, 6, 3, 4, 0, 1, 0, 1, 0, 1, 0, 2]
    );
    accel.done();
}

#[test]
fn test_format_rejection_writes_nothing() {
    let mut accel = accel();
    let good = surface(64, 64, 32);
    let bad = surface(64, 64, 12);

    accel.prepare_solid(&good, RasterOp::COPY, !0, 0).unwrap();
    accel.done();
    let before = accel.channel().cursor();

    assert_eq!(
        accel.prepare_copy(&bad, &good, RasterOp::COPY, !0),
        Err(Error::UnsupportedFormat)
    );
    assert_eq!(
        accel.prepare_upload(&bad, Rect::new(0, 0, 4, 4), 2),
        Err(Error::UnsupportedFormat)
    );
    assert_eq!(accel.channel().cursor(), before);
    assert_eq!(accel.pending(), None);
}

#[test]
fn test_upload_chunking() {
    let mut accel = accel();
    let dst = surface(4096, 8, 32);
    let (width, height) = (4000usize, 3usize);
    let image = vec![0u8; width * 4 * height];

    accel
        .upload(&image, width * 4, &dst, Rect::new(0, 0, width as i32, height as i32), 4)
        .unwrap();
    accel.flush().unwrap();
    assert_eq!(accel.pending(), None);

    let words = accel.channel().device().words();
    let full = Header::non_incrementing(SUBC_2D, twod::SIFC_DATA, 1792).encode();
    let tail = Header::non_incrementing(SUBC_2D, twod::SIFC_DATA, 4000 - 2 * 1792).encode();
    // ceil(4000 / 1792) commands per row
    assert_eq!(positions(&words, full).len(), 2 * height);
    assert_eq!(positions(&words, tail).len(), height);

    let data: usize = positions(&words, full).len() * 1792 + positions(&words, tail).len() * 416;
    assert_eq!(data, width * height);
}

#[test]
fn test_upload_replays_remaining_rows() {
    // 200 words: setup plus five 33-word rows per batch
    let mut accel = accel_with(RingConfig {
        size: ByteSize::from_bytes(800),
        ..RingConfig::default()
    });
    let dst = surface(64, 64, 32);
    let rect = Rect::new(8, 16, 32, 10);
    let rows: Vec<Vec<u8>> = (0..10u8).map(|i| vec![i; 32 * 4]).collect();

    accel.prepare_upload(&dst, rect, 4).unwrap();
    accel.execute_upload(rows.iter().map(Vec::as_slice)).unwrap();
    assert!(!accel.channel().registry().is_armed());
    accel.done();
    accel.flush().unwrap();

    let submitted = accel.channel().device().submitted();
    assert_eq!(submitted.len(), 2);

    let geometry = header(SUBC_2D, twod::SIFC_WIDTH, 10);
    assert_eq!(payload(&submitted[0], geometry)[1], 10);
    assert_eq!(payload(&submitted[0], geometry)[9], 16);

    // The second batch restarts the transfer at row 5.
    let replay = payload(&submitted[1], geometry);
    assert_eq!(replay[1], 5);
    assert_eq!(replay[9], 16 + 5);
    let data = Header::non_incrementing(SUBC_2D, twod::SIFC_DATA, 32).encode();
    let first = positions(&submitted[1], data)[0];
    assert_eq!(submitted[1][first + 1], u32::from_ne_bytes([5; 4]));
    assert_eq!(positions(&submitted[1], data).len(), 5);
}

#[test]
fn test_replay_after_flush_is_idempotent() {
    let mut accel = accel();
    let dst = surface(128, 128, 16);
    accel.prepare_solid(&dst, RasterOp::AND, 0x00ff, 0xabcd).unwrap();
    let setup = accel.channel().cursor();
    accel.execute_solid(Rect::new(0, 0, 2, 2)).unwrap();

    accel.flush().unwrap();
    assert_eq!(accel.channel().cursor(), setup);
    accel.flush().unwrap();
    accel.flush().unwrap();

    let submitted = accel.channel().device().submitted();
    assert_eq!(submitted.len(), 3);
    assert_eq!(&submitted[1][..], &submitted[0][..setup]);
    assert_eq!(submitted[2], submitted[1]);
    assert_eq!(accel.stats().replays, 3);

    // A draw after the flush lands on the replayed state.
    accel.execute_solid(Rect::new(2, 2, 2, 2)).unwrap();
    assert_eq!(
        payload(accel.channel().batch(), header(SUBC_2D, twod::DRAW_POINT32_X0, 4)),
        &[2, 2, 4, 4]
    );
    accel.done();
    accel.flush().unwrap();
    assert_eq!(accel.stats().replays, 3);
}

#[test]
fn test_full_ring_flushes_mid_operation() {
    let mut accel = accel_with(RingConfig {
        size: ByteSize::from_bytes(400),
        ..RingConfig::default()
    });
    accel.prepare_solid(&surface(64, 64, 32), RasterOp::COPY, !0, 0).unwrap();
    for i in 0..40 {
        accel.execute_solid(Rect::new(i, 0, 1, 1)).unwrap();
    }
    accel.done();

    let submitted = accel.channel().device().submitted();
    assert!(!submitted.is_empty());
    // Every batch opens with the destination binding.
    for batch in submitted {
        assert_eq!(batch[0], header(SUBC_2D, twod::DST_FORMAT, 5));
    }
}
