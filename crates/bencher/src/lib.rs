//! Fixtures shared by the strand benchmarks.

/// One benchmark input: a named wire capture or header value.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
}

impl TestCase {
    pub const fn new(name: &'static str, file: TestFile) -> Self {
        Self { name, file }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static [u8],
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static [u8]) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A `Range` header value resolved against a resource of `size` bytes.
#[derive(Debug, Copy, Clone)]
pub struct RangeCase {
    pub name: &'static str,
    pub header: &'static str,
    pub size: u64,
}

pub const RANGE_CASES: [RangeCase; 5] = [
    RangeCase { name: "suffix", header: "bytes=-100", size: 500 },
    RangeCase { name: "open_ended", header: "bytes=100-", size: 500 },
    RangeCase { name: "bounded", header: "bytes=0-99", size: 500 },
    RangeCase { name: "large_offsets", header: "bytes=1073741824-2147483647", size: 4_294_967_296 },
    RangeCase { name: "malformed", header: "bytes=abc", size: 500 },
];
