use std::io::Read;

mod error;
pub use error::{Error, Result};

/// A reader that is drained at most once, the first time its content is asked for.
///
/// Used for the piped stdout of a benchmark process: the runner drains it as raw
/// bytes before reaping the child, collectors then ask for the same buffer as text.
pub enum LazyRead<T>
where
    T: Read,
{
    Orig(T),
    Bytes(Vec<u8>),
    String(String),
}

impl<T> LazyRead<T>
where
    T: Read,
{
    pub fn new(input: T) -> Self {
        Self::Orig(input)
    }

    fn drain(&mut self) -> Result<()> {
        if let LazyRead::Orig(v) = self {
            let mut tmp = Vec::new();
            v.read_to_end(&mut tmp)?;
            *self = LazyRead::Bytes(tmp);
        }
        Ok(())
    }

    pub fn get_bytes(&mut self) -> Result<&[u8]> {
        self.drain()?;
        Ok(match self {
            LazyRead::Bytes(b) => b.as_slice(),
            LazyRead::String(s) => s.as_bytes(),
            LazyRead::Orig(_) => unreachable!(),
        })
    }

    pub fn get_string(&mut self) -> Result<&str> {
        self.drain()?;
        if let LazyRead::Bytes(b) = self {
            match String::from_utf8(std::mem::take(b)) {
                Ok(s) => *self = LazyRead::String(s),
                Err(e) => {
                    let valid_up_to = e.utf8_error().valid_up_to();
                    // hand the raw bytes back so get_bytes still works
                    *b = e.into_bytes();
                    return Err(Error::NotUtf8 {
                        valid_up_to,
                        len: b.len(),
                    });
                }
            }
        }

        Ok(if let LazyRead::String(s) = self {
            s
        } else {
            unreachable!()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        reads: usize,
    }

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    #[test]
    fn reads_once() {
        let mut lazy = LazyRead::new(Cursor::new(b"hello 1.0MiB/s".to_vec()));
        assert_eq!(lazy.get_string().unwrap(), "hello 1.0MiB/s");
        assert_eq!(lazy.get_string().unwrap(), "hello 1.0MiB/s");
        assert_eq!(lazy.get_bytes().unwrap(), b"hello 1.0MiB/s");
    }

    #[test]
    fn does_not_touch_the_reader_until_asked() {
        let reader = CountingReader {
            inner: Cursor::new(b"abc".to_vec()),
            reads: 0,
        };
        let lazy = LazyRead::new(reader);
        match lazy {
            LazyRead::Orig(r) => assert_eq!(r.reads, 0),
            _ => panic!("reader was drained eagerly"),
        }
    }

    #[test]
    fn invalid_utf8_is_an_error_and_bytes_survive() {
        let mut lazy = LazyRead::new(Cursor::new(vec![b'o', b'k', 0xff, b'!']));
        let err = lazy.get_string().unwrap_err();
        assert!(matches!(
            err,
            Error::NotUtf8 {
                valid_up_to: 2,
                len: 4
            }
        ));
        assert!(err.to_string().starts_with("UTF8 Error"));
        assert_eq!(lazy.get_bytes().unwrap(), &[b'o', b'k', 0xff, b'!']);
    }
}
