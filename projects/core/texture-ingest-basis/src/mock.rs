//! A scriptable in-memory transcoder.
//!
//! [`MockBlob`] encodes a tiny stand-in for a Basis file (image and level dimensions plus an
//! alpha flag). [`MockTranscoder`] opens such blobs and "transcodes" them into correctly sized
//! buffers, failing, blocking or panicking wherever its [`MockBehavior`] says to.

use crate::error::NativeError;
use crate::format::BasisFormat;
use crate::transcoder::{BasisFile, TranscoderModule, TranscoderModuleFactory};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const MOCK_MAGIC: &[u8; 8] = b"MOCKBASS";

/// A fake Basis file: one list of level dimensions per image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockBlob {
    pub has_alpha: bool,
    pub images: Vec<Vec<(u32, u32)>>,
}

impl MockBlob {
    pub fn new(images: Vec<Vec<(u32, u32)>>) -> Self {
        Self {
            has_alpha: false,
            images,
        }
    }

    /// One image with `levels` halving levels starting at `width` x `height`.
    pub fn single(width: u32, height: u32, levels: u32) -> Self {
        let chain = (0..levels)
            .map(|level| ((width >> level).max(1), (height >> level).max(1)))
            .collect();
        Self::new(vec![chain])
    }

    pub fn with_alpha(mut self) -> Self {
        self.has_alpha = true;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = MOCK_MAGIC.to_vec();
        out.push(self.has_alpha as u8);
        out.extend_from_slice(&(self.images.len() as u32).to_le_bytes());
        for levels in &self.images {
            out.extend_from_slice(&(levels.len() as u32).to_le_bytes());
            for (width, height) in levels {
                out.extend_from_slice(&width.to_le_bytes());
                out.extend_from_slice(&height.to_le_bytes());
            }
        }
        out
    }

    pub fn decode(data: &[u8]) -> Option<Self> {
        let rest = data.strip_prefix(MOCK_MAGIC.as_slice())?;
        let (&alpha, mut rest) = rest.split_first()?;
        let mut next_u32 = || -> Option<u32> {
            let (head, tail) = rest.split_first_chunk::<4>()?;
            rest = tail;
            Some(u32::from_le_bytes(*head))
        };

        let image_count = next_u32()?;
        let mut images = Vec::new();
        for _ in 0..image_count {
            let level_count = next_u32()?;
            let mut levels = Vec::new();
            for _ in 0..level_count {
                levels.push((next_u32()?, next_u32()?));
            }
            images.push(levels);
        }
        Some(Self {
            has_alpha: alpha != 0,
            images,
        })
    }
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    waiting: usize,
}

/// Blocks transcodes until opened. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

impl MockGate {
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        let (state, condvar) = &*self.inner;
        state.lock().open = true;
        condvar.notify_all();
    }

    /// Number of transcodes currently blocked on the gate.
    pub fn waiting(&self) -> usize {
        self.inner.0.lock().waiting
    }

    fn pass(&self) {
        let (state, condvar) = &*self.inner;
        let mut state = state.lock();
        state.waiting += 1;
        while !state.open {
            condvar.wait(&mut state);
        }
        state.waiting -= 1;
    }
}

/// What the mock should get wrong.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    failing_inits: usize,
    fail_start: bool,
    fail_all_transcodes: bool,
    panic_on_transcode: bool,
    failing_formats: Vec<BasisFormat>,
    failing_levels: Vec<(BasisFormat, u32, u32)>,
    required_payload: Option<Vec<u8>>,
    gate: Option<MockGate>,
}

impl MockBehavior {
    /// Module instantiation always fails.
    pub fn fail_init(mut self) -> Self {
        self.failing_inits = usize::MAX;
        self
    }

    /// The first `count` module instantiations fail, later ones succeed.
    pub fn fail_first_inits(mut self, count: usize) -> Self {
        self.failing_inits = count;
        self
    }

    /// Module instantiation fails unless the payload equals `payload`.
    pub fn require_payload(mut self, payload: &[u8]) -> Self {
        self.required_payload = Some(payload.to_vec());
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Every level transcode to `format` fails.
    pub fn fail_format(mut self, format: BasisFormat) -> Self {
        self.failing_formats.push(format);
        self
    }

    /// One level transcode fails.
    pub fn fail_level(mut self, format: BasisFormat, image: u32, level: u32) -> Self {
        self.failing_levels.push((format, image, level));
        self
    }

    /// Every level transcode fails, whatever the format.
    pub fn fail_all_transcodes(mut self) -> Self {
        self.fail_all_transcodes = true;
        self
    }

    /// The transcoding thread panics when a session starts.
    pub fn panic_on_transcode(mut self) -> Self {
        self.panic_on_transcode = true;
        self
    }

    /// Every session start blocks until `gate` opens.
    pub fn gated(mut self, gate: MockGate) -> Self {
        self.gate = Some(gate);
        self
    }

    fn level_fails(&self, format: BasisFormat, image: u32, level: u32) -> bool {
        self.fail_all_transcodes
            || self.failing_formats.contains(&format)
            || self.failing_levels.contains(&(format, image, level))
    }
}

/// Factory for mock modules. Clones share counters.
#[derive(Debug, Clone, Default)]
pub struct MockTranscoder {
    behavior: Arc<MockBehavior>,
    instantiations: Arc<AtomicUsize>,
    sessions: Arc<AtomicUsize>,
}

impl MockTranscoder {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(behavior),
            ..Default::default()
        }
    }

    /// Modules created so far, failed ones included.
    pub fn instantiations(&self) -> usize {
        self.instantiations.load(Ordering::SeqCst)
    }

    /// Transcoding sessions started so far.
    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl TranscoderModuleFactory for MockTranscoder {
    fn instantiate(&self, payload: &[u8]) -> Result<Box<dyn TranscoderModule>, NativeError> {
        let attempt = self.instantiations.fetch_add(1, Ordering::SeqCst);
        if attempt < self.behavior.failing_inits {
            return Err(NativeError::new("mock module refused to initialize"));
        }
        if let Some(required) = &self.behavior.required_payload {
            if required.as_slice() != payload {
                return Err(NativeError::new("unexpected transcoder payload"));
            }
        }
        Ok(Box::new(MockModule {
            behavior: Arc::clone(&self.behavior),
            sessions: Arc::clone(&self.sessions),
        }))
    }
}

struct MockModule {
    behavior: Arc<MockBehavior>,
    sessions: Arc<AtomicUsize>,
}

impl TranscoderModule for MockModule {
    fn open<'a>(&'a self, blob: &'a [u8]) -> Option<Box<dyn BasisFile + 'a>> {
        let blob = MockBlob::decode(blob)?;
        Some(Box::new(MockFile {
            module: self,
            blob,
            started: false,
        }))
    }
}

struct MockFile<'a> {
    module: &'a MockModule,
    blob: MockBlob,
    started: bool,
}

impl BasisFile for MockFile<'_> {
    fn has_alpha(&self) -> bool {
        self.blob.has_alpha
    }

    fn start_transcoding(&mut self) -> Result<(), NativeError> {
        let behavior = &self.module.behavior;
        if let Some(gate) = &behavior.gate {
            gate.pass();
        }
        if behavior.panic_on_transcode {
            panic!("mock transcoder crashed");
        }
        if behavior.fail_start {
            return Err(NativeError::new("mock session refused to start"));
        }
        self.module.sessions.fetch_add(1, Ordering::SeqCst);
        self.started = true;
        Ok(())
    }

    fn image_count(&self) -> u32 {
        self.blob.images.len() as u32
    }

    fn level_count(&self, image: u32) -> u32 {
        self.blob
            .images
            .get(image as usize)
            .map_or(0, |levels| levels.len() as u32)
    }

    fn level_dimensions(&self, image: u32, level: u32) -> Option<(u32, u32)> {
        self.blob
            .images
            .get(image as usize)?
            .get(level as usize)
            .copied()
    }

    fn transcoded_size(&self, image: u32, level: u32, format: BasisFormat) -> Option<usize> {
        let (width, height) = self.level_dimensions(image, level)?;
        format.texture_format()?.level_byte_len(width, height)
    }

    fn transcode_level(
        &mut self,
        dst: &mut [u8],
        image: u32,
        level: u32,
        format: BasisFormat,
    ) -> Result<(), NativeError> {
        if !self.started {
            return Err(NativeError::new("transcoding session not started"));
        }
        if self.module.behavior.level_fails(format, image, level) {
            return Err(NativeError::new("mock transcode failure"));
        }
        if Some(dst.len()) != self.transcoded_size(image, level, format) {
            return Err(NativeError::new("destination has the wrong size"));
        }
        dst.fill(format.native_value() as u8 ^ level as u8);
        Ok(())
    }
}
