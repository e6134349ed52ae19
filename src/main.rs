use std::env;
use std::process;

fn main() {
    let path = match env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: trackprobe <file>");
            process::exit(2);
        }
    };

    match trackprobe::extract_tracks(&path, trackprobe::Options::default()) {
        Ok(tracks) => {
            for track in tracks {
                println!(
                    "#{} {} codec={} lang={} name={:?}",
                    track.id, track.kind, track.codec, track.language, track.name
                );
            }
        }
        Err(e) => {
            eprintln!("{}: {}", path, e);
            process::exit(1);
        }
    }
}
