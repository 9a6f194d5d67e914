mod common;

use common::{compat_device, ms, timer_device, ScriptBus};
use hda_codec::verb::{
    AC_VERB_SET_AMP_GAIN_MUTE, AC_VERB_SET_CHANNEL_STREAMID, AC_VERB_SET_STREAM_FORMAT,
};
use hda_codec::{Direction, HdaAudio, MemoryBackend};

const OUT: usize = 0;
const IN: usize = 1;

fn start_output(dev: &mut HdaAudio<MemoryBackend>, tag: u8, now: u64) {
    dev.execute(0x02, AC_VERB_SET_STREAM_FORMAT, 0x0011, now);
    dev.execute(0x02, AC_VERB_SET_CHANNEL_STREAMID, u32::from(tag) << 4, now);
    dev.stream_notice(tag, true, true, now);
}

#[test]
fn timer_mode_resumes_mid_transfer() {
    let mut src = timer_device();
    let mut bus = ScriptBus::new();
    start_output(&mut src, 1, 0);
    // Output amp: left gain 0x20, right muted.
    src.execute(0x02, AC_VERB_SET_AMP_GAIN_MUTE, 0xa020, 0);
    src.execute(0x02, AC_VERB_SET_AMP_GAIN_MUTE, 0x9080, 0);
    src.run_timers(ms(3), &mut bus);
    src.backend_callback(OUT, 100, ms(3), &mut bus);

    let bytes = src.save_snapshot();
    let mut dst = timer_device();
    dst.load_snapshot(&bytes, ms(3) + 500).unwrap();

    let (a, b) = (src.stream(OUT).unwrap(), dst.stream(OUT).unwrap());
    assert!(b.is_running());
    assert_eq!(b.raw_format(), 0x0011);
    assert_eq!(b.format(), a.format());
    assert_eq!(b.amp(), a.amp());
    assert_eq!((b.stream_tag(), b.channel()), (1, 0));
    assert_eq!(
        (b.ring().rpos(), b.ring().wpos()),
        (a.ring().rpos(), a.ring().wpos())
    );
    assert_eq!(b.ring().as_bytes(), a.ring().as_bytes());
    assert_eq!(b.timer_anchor_ns(), a.timer_anchor_ns());
    // Re-armed at the saved deadline, not relative to the restore time.
    assert_eq!(dst.next_deadline_ns(), src.next_deadline_ns());

    let src_voice = src.backend().voice(a.voice().unwrap()).unwrap();
    let dst_voice = dst.backend().voice(b.voice().unwrap()).unwrap();
    assert!(dst_voice.active);
    assert_eq!(dst_voice.format, src_voice.format);
    assert_eq!(dst_voice.volume, src_voice.volume);

    // Both devices pace identically from here on.
    let mut src_bus = ScriptBus::new();
    let mut dst_bus = ScriptBus::new();
    src.run_timers(ms(4), &mut src_bus);
    dst.run_timers(ms(4), &mut dst_bus);
    assert_eq!(src_bus.xfers, dst_bus.xfers);
    assert_eq!(
        dst.stream(OUT).unwrap().ring().wpos(),
        src.stream(OUT).unwrap().ring().wpos()
    );
}

#[test]
fn stopped_streams_stay_stopped() {
    let mut src = timer_device();
    src.execute(0x07, AC_VERB_SET_STREAM_FORMAT, 0x4011, 0);
    let bytes = src.save_snapshot();

    let mut dst = timer_device();
    dst.load_snapshot(&bytes, 0).unwrap();
    let st = dst.stream(IN).unwrap();
    assert!(!st.is_running());
    assert_eq!(st.format().sample_rate, 44_100);
    assert!(dst.next_deadline_ns().is_none());
    assert!(!dst.backend().voice(st.voice().unwrap()).unwrap().active);
}

#[test]
fn legacy_snapshot_only_resumes_output() {
    let mut src = timer_device();
    start_output(&mut src, 1, 0);
    src.execute(0x07, AC_VERB_SET_CHANNEL_STREAMID, 0x10, 0);
    src.stream_notice(1, true, false, 0);
    assert!(src.stream(IN).unwrap().is_running());

    let bytes = src.snapshot_state().save_legacy_state();
    let mut dst = timer_device();
    dst.load_snapshot(&bytes, ms(1)).unwrap();

    assert!(dst.ledger().is_running(Direction::Output, 1));
    assert!(!dst.ledger().is_running(Direction::Input, 1));
    assert!(dst.stream(OUT).unwrap().is_running());
    assert!(!dst.stream(IN).unwrap().is_running());
    assert_eq!(dst.stream(IN).unwrap().stream_tag(), 1);
}

#[test]
fn callback_mode_keeps_partial_block() {
    let mut src = compat_device();
    let mut bus = ScriptBus::new();
    start_output(&mut src, 2, 0);
    src.backend_mut().set_io_limit(Some(100));
    src.backend_callback(OUT, 1024, 0, &mut bus);
    assert_eq!(src.stream(OUT).unwrap().compat_bpos(), 100);

    let state = src.snapshot_state();
    assert!(state.streams.iter().all(|s| s.buffer.is_none()));

    let mut dst = compat_device();
    dst.load_snapshot(&src.save_snapshot(), 0).unwrap();
    let st = dst.stream(OUT).unwrap();
    assert!(st.is_running());
    assert_eq!(st.compat_bpos(), 100);
    assert!(dst.next_deadline_ns().is_none());

    // The rest of the staged block is played before anything new is fetched.
    let voice = st.voice().unwrap();
    let mut bus = ScriptBus::new();
    dst.backend_callback(OUT, 156 + 256, 0, &mut bus);
    assert_eq!(bus.xfers, vec![(2, true, 256)]);
    let played = dst.backend_mut().take_played(voice);
    let expected: Vec<u8> = (100..256u32).map(|i| i as u8).collect();
    assert_eq!(played.len(), 412);
    assert_eq!(played[..156], expected[..]);
}

#[test]
fn corrupt_blob_leaves_device_untouched() {
    let mut dev = timer_device();
    start_output(&mut dev, 1, 0);
    let mut bytes = dev.save_snapshot();
    bytes.truncate(bytes.len() / 2);

    assert!(dev.load_snapshot(&bytes, ms(1)).is_err());
    assert!(dev.stream(OUT).unwrap().is_running());
    assert_eq!(dev.next_deadline_ns(), Some(ms(1)));

    assert!(dev.load_snapshot(b"not a snapshot", 0).is_err());
    assert_eq!(dev.stream(OUT).unwrap().raw_format(), 0x0011);
}
