#![no_main]

use libfuzzer_sys::fuzz_target;
use thrift_rpc::*;

fuzz_target!(|data: &[u8]| {
    // Envelope decode must never panic, whatever the bytes.
    let mut request = RequestMessage::default();
    if request.decode(NonContiguousBuffer::from(data)).is_ok() {
        // A decoded header re-encodes without error.
        let mut again = RequestMessage::default();
        again.header = request.header.clone();
        again.set_body(request.take_body());
        again.encode().expect("re-encode of decoded message");
    }

    // Neither must descriptor-driven struct decoding.
    let mut input = NonContiguousBuffer::from(data);
    let mut buf = ThriftBuffer::reading(&mut input);
    let mut exception = ThriftException::default();
    let _ = read_struct(&mut buf, &mut exception);
});
