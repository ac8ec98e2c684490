use resp::DecodeResult;
use resp::ReadBuffer;
use resp::RespDecoder;

fn main() {
	println!("--- RESP Streaming Decode Example ---");

	// Simulate replies arriving from a socket in arbitrary fragments:
	// - A Simple String: "+OK\r\n"
	// - An Integer: ":1000\r\n"
	// - An Array with a null bulk string: "*2\r\n$3\r\nfoo\r\n$-1\r\n"
	let data_chunks = vec![
		b"+O".as_slice(),
		b"K\r\n:1".as_slice(),
		b"00".as_slice(),
		b"0\r\n*2\r\n$3\r\nfo".as_slice(),
		b"o\r\n$-".as_slice(),
		b"1\r\n".as_slice(),
	];

	let mut decoder = RespDecoder::new();
	let mut buffer = ReadBuffer::new();

	for (i, chunk) in data_chunks.iter().enumerate() {
		println!(
			"\n[Stream] Received Chunk {}: {:?}",
			i,
			String::from_utf8_lossy(chunk)
		);

		buffer.append(chunk);

		loop {
			match decoder.decode(&mut buffer) {
				DecodeResult::Complete(value) => {
					println!("[Decoder] Complete:\n{}", value);
				}
				DecodeResult::Incomplete => {
					println!("[Decoder] Incomplete, waiting for more data...");
					break;
				}
				DecodeResult::Error(e) => {
					eprintln!("[Decoder] Error: {}", e);
					break;
				}
			}
		}
	}
}
