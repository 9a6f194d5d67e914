/// Controller-side services a codec needs.
pub trait HdaCodecBus {
    /// Move one chunk of stream `stream_tag`'s DMA data. For output, the bus fills `buf` with guest
    /// audio; for input, it consumes `buf`. Returns `false` if the transfer could not be made.
    fn xfer(&mut self, stream_tag: u8, output: bool, buf: &mut [u8]) -> bool;

    /// Deliver a response word to the guest.
    fn response(&mut self, solicited: bool, data: u32);
}

/// Response produced for one command word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HdaResponse {
    pub solicited: bool,
    pub data: u32,
}

impl HdaResponse {
    pub fn solicited(data: u32) -> Self {
        Self {
            solicited: true,
            data,
        }
    }
}
