use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clipdeck::rendering::kitty::{APC_END, APC_START};
use clipdeck::rendering::{CellMetrics, KittyTransport, ScaleUnit};

/// Split a sequence into (control, payload) per frame
fn split_frames(sequence: &str) -> Vec<(String, String)> {
    sequence
        .split(APC_END)
        .filter(|frame| !frame.is_empty())
        .map(|frame| {
            let body = frame.strip_prefix(APC_START).expect("frame starts with APC");
            let (control, payload) = body.split_once(';').expect("frame has payload");
            (control.to_string(), payload.to_string())
        })
        .collect()
}

#[test]
fn test_fifty_thousand_byte_payload_makes_thirteen_frames() {
    let transport = KittyTransport::default();
    // 37,500 raw bytes encode to exactly 50,000 base64 bytes
    let bytes = vec![0xA5u8; 37_500];
    let frames = split_frames(&transport.encode(&bytes, 20, 10));

    assert_eq!(frames.len(), 13);
    for (_, payload) in &frames[..12] {
        assert_eq!(payload.len(), 4096);
    }
    assert_eq!(frames[12].1.len(), 3808);

    assert_eq!(frames[0].0, "a=T,f=100,s=200,v=180,q=2,m=1");
    for (control, _) in &frames[1..12] {
        assert_eq!(control, "m=1");
    }
    assert_eq!(frames[12].0, "m=0");
}

#[test]
fn test_concatenated_payloads_decode_to_input() {
    let transport = KittyTransport::default();
    let bytes: Vec<u8> = (0..20_000u32).map(|i| (i * 31 % 251) as u8).collect();
    let frames = split_frames(&transport.encode(&bytes, 8, 4));

    let joined: String = frames.iter().map(|(_, payload)| payload.as_str()).collect();
    assert_eq!(STANDARD.decode(joined).unwrap(), bytes);
    assert_eq!(frames.len(), joined_len(&bytes).div_ceil(4096));
}

fn joined_len(bytes: &[u8]) -> usize {
    STANDARD.encode(bytes).len()
}

#[test]
fn test_small_payload_is_a_single_frame() {
    let transport = KittyTransport::new(CellMetrics::DEFAULT).with_scale_unit(ScaleUnit::Cells);
    let frames = split_frames(&transport.encode(b"tiny", 3, 2));

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, "a=T,f=100,c=3,r=2,q=2,m=0");
    assert_eq!(frames[0].1, STANDARD.encode(b"tiny"));
}

#[test]
fn test_delete_all_sequence() {
    assert_eq!(KittyTransport::delete_all_images(), "\x1b_Ga=d,d=A\x1b\\");

    let mut out = Vec::new();
    KittyTransport::clear(&mut out).unwrap();
    assert_eq!(out, b"\x1b_Ga=d,d=A\x1b\\");
}
