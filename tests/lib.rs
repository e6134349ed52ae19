use std::io::Cursor;

use trackprobe::{extract_tracks_from, Error, Options, TrackKind};

fn boxed(name: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(8 + payload.len());
    v.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
    v.extend_from_slice(name);
    v.extend_from_slice(payload);
    v
}

fn ftyp() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(b"isom");
    payload.extend_from_slice(&0u32.to_be_bytes());
    payload.extend_from_slice(b"isom");
    boxed(b"ftyp", &payload)
}

fn tkhd_payload(track_id: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 84];
    payload[3] = 3;
    payload[4..8].copy_from_slice(&100u32.to_be_bytes());
    payload[8..12].copy_from_slice(&200u32.to_be_bytes());
    payload[12..16].copy_from_slice(&track_id.to_be_bytes());
    payload
}

fn mdhd_payload(language: u16) -> Vec<u8> {
    let mut payload = vec![0u8; 24];
    payload[12..16].copy_from_slice(&1000u32.to_be_bytes()); // timescale
    payload[20..22].copy_from_slice(&language.to_be_bytes());
    payload
}

fn hdlr_payload(handler: &[u8; 4], name: &str) -> Vec<u8> {
    let mut payload = vec![0u8; 24];
    payload[8..12].copy_from_slice(handler);
    payload.extend_from_slice(name.as_bytes());
    payload.push(0);
    payload
}

fn stsd_payload(entry_name: &[u8; 4]) -> Vec<u8> {
    let mut payload = vec![0u8; 8];
    payload[4..8].copy_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&16u32.to_be_bytes());
    payload.extend_from_slice(entry_name);
    payload.extend_from_slice(&[0u8; 8]);
    payload
}

fn video_trak(track_id: u32, language: u16) -> Vec<u8> {
    let stsd = boxed(b"stsd", &stsd_payload(b"avc1"));
    let stbl = boxed(b"stbl", &stsd);
    let minf = boxed(b"minf", &stbl);

    let mut mdia_payload = boxed(b"mdhd", &mdhd_payload(language));
    mdia_payload.extend_from_slice(&boxed(b"hdlr", &hdlr_payload(b"vide", "VideoHandler")));
    mdia_payload.extend_from_slice(&minf);
    let mdia = boxed(b"mdia", &mdia_payload);

    let mut trak_payload = boxed(b"tkhd", &tkhd_payload(track_id));
    trak_payload.extend_from_slice(&mdia);
    boxed(b"trak", &trak_payload)
}

const LANG_ENG: u16 = 0x15C7;
const LANG_UND: u16 = 0x55C4;

#[test]
fn test_extract_tracks_mp4() {
    let mut file = ftyp();
    let mut moov_payload = video_trak(1, LANG_ENG);
    moov_payload.extend_from_slice(&video_trak(2, LANG_UND));
    file.extend_from_slice(&boxed(b"moov", &moov_payload));

    let tracks = extract_tracks_from(Cursor::new(file), Options::default()).unwrap();
    assert_eq!(tracks.len(), 2);

    assert_eq!(tracks[0].id, 1);
    assert_eq!(tracks[0].kind, TrackKind::Video);
    assert_eq!(tracks[0].codec, "avc1");
    assert_eq!(tracks[0].language, "eng");
    assert_eq!(tracks[0].name, "VideoHandler");
    assert_eq!(tracks[0].creation_time, 100);
    assert_eq!(tracks[0].modification_time, 200);

    assert_eq!(tracks[1].id, 2);
    assert_eq!(tracks[1].language, "und");
}

#[test]
fn test_extract_tracks_minimal_chain() {
    // moov > trak > mdia > mdhd with nothing else still resolves a track
    let mdia = boxed(b"mdia", &boxed(b"mdhd", &mdhd_payload(LANG_ENG)));
    let trak = boxed(b"trak", &mdia);
    let mut file = ftyp();
    file.extend_from_slice(&boxed(b"moov", &trak));

    let tracks = extract_tracks_from(Cursor::new(file), Options::default()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].language, "eng");
    assert_eq!(tracks[0].kind, TrackKind::Other);
}

#[test]
fn test_extract_tracks_skips_mdat_reseek() {
    // mdat larger than the default chunk forces a pause/re-seek/resume
    // round trip before the moov is reached
    let mut file = ftyp();
    let mdat_payload_len = trackprobe::DEFAULT_CHUNK_SIZE as usize + 512;
    file.extend_from_slice(&(mdat_payload_len as u32 + 8).to_be_bytes());
    file.extend_from_slice(b"mdat");
    file.resize(file.len() + mdat_payload_len, 0);
    file.extend_from_slice(&boxed(b"moov", &video_trak(9, LANG_ENG)));

    let tracks = extract_tracks_from(Cursor::new(file), Options::default()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 9);
}

#[test]
fn test_extract_tracks_mkv() {
    fn ebml(id: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(id);
        v.push(0x80 | payload.len() as u8);
        v.extend_from_slice(payload);
        v
    }

    let mut entry = ebml(&[0xD7], &[0x01]);
    entry.extend_from_slice(&ebml(&[0x83], &[0x01]));
    entry.extend_from_slice(&ebml(&[0x86], b"V_VP9"));
    entry.extend_from_slice(&ebml(&[0x22, 0xB5, 0x9C], b"und"));
    let tracks_el = ebml(&[0x16, 0x54, 0xAE, 0x6B], &ebml(&[0xAE], &entry));

    let mut file = ebml(&[0x1A, 0x45, 0xDF, 0xA3], &[0u8; 4]);
    file.extend_from_slice(&ebml(&[0x18, 0x53, 0x80, 0x67], &tracks_el));

    let tracks = extract_tracks_from(Cursor::new(file), Options::default()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 1);
    assert_eq!(tracks[0].kind, TrackKind::Video);
    assert_eq!(tracks[0].codec, "V_VP9");
    assert_eq!(tracks[0].language, "und");
}

#[test]
fn test_unsupported_format() {
    let mut file = Vec::new();
    file.extend_from_slice(b"RIFF");
    file.extend_from_slice(&[0u8; 64]);

    match extract_tracks_from(Cursor::new(file), Options::default()) {
        Err(Error::UnsupportedFormat) => {}
        other => panic!("expected UnsupportedFormat, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_empty_source_is_unsupported() {
    match extract_tracks_from(Cursor::new(Vec::new()), Options::default()) {
        Err(Error::UnsupportedFormat) => {}
        other => panic!("expected UnsupportedFormat, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_quota_exceeded() {
    let mut file = ftyp();
    file.extend_from_slice(&boxed(b"moov", &video_trak(1, LANG_ENG)));
    assert!(file.len() > 64);

    let options = Options {
        max_bytes_limit: Some(64),
    };
    match extract_tracks_from(Cursor::new(file), options) {
        Err(Error::QuotaExceeded(64)) => {}
        other => panic!("expected QuotaExceeded, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_truncated_moov_is_decode_failure() {
    let mut file = ftyp();
    let moov = boxed(b"moov", &video_trak(1, LANG_ENG));
    // declared size intact, last bytes missing
    file.extend_from_slice(&moov[..moov.len() - 12]);

    match extract_tracks_from(Cursor::new(file), Options::default()) {
        Err(Error::InvalidData(_)) => {}
        other => panic!("expected InvalidData, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_forged_extended_size_is_decode_failure() {
    // moov declaring a 2^63-byte extended size must fail cleanly, not
    // allocate or panic
    let mut file = ftyp();
    file.extend_from_slice(&1u32.to_be_bytes());
    file.extend_from_slice(b"moov");
    file.extend_from_slice(&(1u64 << 63).to_be_bytes());

    match extract_tracks_from(Cursor::new(file), Options::default()) {
        Err(Error::InvalidData(_)) => {}
        other => panic!("expected InvalidData, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_missing_moov_is_decode_failure() {
    let file = ftyp();
    match extract_tracks_from(Cursor::new(file), Options::default()) {
        Err(Error::InvalidData(_)) => {}
        other => panic!("expected InvalidData, got {:?}", other.map(|t| t.len())),
    }
}
