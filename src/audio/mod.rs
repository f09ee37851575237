pub mod chunk;
pub mod source;
pub mod wav;

pub use chunk::{normalize_frame, AudioChunk, ChunkBuffer};
pub use source::{
    list_input_devices, AudioFrame, AudioSource, CpalSource, DeviceSelector, ScriptedSource,
    FRAME_CHANNEL_CAPACITY,
};
pub use wav::{encode_wav, write_wav_file};
