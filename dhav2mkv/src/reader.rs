//! Input reader thread.

use std::io::{self, Read};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info};

/// Chunks buffered between the reader and the transcoder.
pub const INPUT_CHANNEL_CAPACITY: usize = 8;

/// Spawn a thread reading `input` in chunks of up to `chunk_len` bytes.
///
/// The channel closes at end of input. A read error is delivered as the
/// last message.
pub fn spawn_reader<R>(
    mut input: R,
    chunk_len: usize,
) -> io::Result<(Receiver<io::Result<Bytes>>, JoinHandle<()>)>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(INPUT_CHANNEL_CAPACITY);
    let handle = thread::Builder::new()
        .name("input-reader".into())
        .spawn(move || read_loop(&mut input, chunk_len, &tx))?;
    Ok((rx, handle))
}

fn read_loop<R: Read>(input: &mut R, chunk_len: usize, tx: &Sender<io::Result<Bytes>>) {
    let mut buf = vec![0u8; chunk_len];
    let mut total: u64 = 0;
    loop {
        let message = match input.read(&mut buf) {
            Ok(0) => {
                info!(bytes = total, "End of input");
                return;
            }
            Ok(n) => {
                total += n as u64;
                Ok(Bytes::copy_from_slice(&buf[..n]))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };

        let failed = message.is_err();
        if tx.send(message).is_err() {
            debug!("Transcoder gone, reader stopping");
            return;
        }
        if failed {
            return;
        }
    }
}
