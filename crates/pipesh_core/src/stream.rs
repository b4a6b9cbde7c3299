use std::{
    fmt::Debug,
    fs::{File, OpenOptions},
    io::{self, Cursor, Read, Write},
    path::PathBuf,
    process::Stdio,
    sync::Arc,
};

use os_pipe::{PipeReader, PipeWriter};
use parking_lot::Mutex;
use thiserror::Error;

/// Stream-related errors.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream cannot be used for output")]
    UnusableForOutput,
    #[error("stream cannot be used for input")]
    UnusableForInput,
    #[error("file {0:?} is not readable: {1}")]
    FileNotReadable(PathBuf, #[source] io::Error),
    #[error("file {0:?} is not writable: {1}")]
    FileNotWritable(PathBuf, #[source] io::Error),
    #[error("failed to duplicate stream handle: {0}")]
    CloneFailed(#[source] io::Error),
}

/// An input for a process.
pub enum Input {
    /// Handed to the process as-is.
    Direct(Stdio),
    /// Must be copied into the process through a pipe.
    Feed(Box<dyn Read + Send>),
}

/// An output for a process.
pub enum Output {
    /// Handed to the process as-is.
    Direct(Stdio),
    /// Must be copied from the process through a pipe.
    Sink(Box<dyn Write + Send>),
}

/// A source, and/or, target for the standard streams of a pipeline.
pub enum Stream {
    /// The current process' corresponding standard stream.
    Inherit,
    /// Empty input, or discarded output.
    Null,
    /// In-memory input. Every use reads the bytes from the start.
    Bytes(Vec<u8>),
    /// A pipe with a [`PipeReader`] output and a [`PipeWriter`] input.
    Pipe((PipeReader, PipeWriter)),
    /// A file handle to an opened file.
    FileHandle(File),
    /// A file path. Can be used for reading and/or writing.
    ///
    /// Converted to a [`Stream::FileHandle`] on use.
    File(PathBuf),
    /// A file path for appending data to. Can only be used for writing.
    ///
    /// Converted to a [`Stream::FileHandle`] on use.
    AppendFile(PathBuf),
    /// Any reader. Consumed by the first use.
    Reader(Arc<Mutex<dyn Read + Send>>),
    /// Any writer.
    Writer(Arc<Mutex<dyn Write + Send>>),
    /// In-memory output capture.
    Buffer(Arc<Mutex<Vec<u8>>>),
}

impl Stream {
    /// Wraps a reader.
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Stream::Reader(Arc::new(Mutex::new(reader)))
    }

    /// Wraps a writer.
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Stream::Writer(Arc::new(Mutex::new(writer)))
    }

    /// Creates an empty in-memory capture buffer.
    pub fn buffer() -> Self {
        Stream::Buffer(Arc::default())
    }

    /// Returns the bytes captured by a [`Stream::Buffer`], leaving it empty.
    pub fn take_buffer(&self) -> Option<Vec<u8>> {
        match self {
            Stream::Buffer(buffer) => Some(std::mem::take(&mut *buffer.lock())),
            _ => None,
        }
    }

    /// Creates a clone of the stream.
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(match self {
            Stream::Inherit => Stream::Inherit,
            Stream::Null => Stream::Null,
            Stream::Bytes(bytes) => Stream::Bytes(bytes.clone()),
            Stream::Pipe((reader, writer)) => {
                Stream::Pipe((reader.try_clone()?, writer.try_clone()?))
            }
            Stream::FileHandle(file) => Stream::FileHandle(file.try_clone()?),
            Stream::File(path) => Stream::File(path.clone()),
            Stream::AppendFile(path) => Stream::AppendFile(path.clone()),
            Stream::Reader(reader) => Stream::Reader(Arc::clone(reader)),
            Stream::Writer(writer) => Stream::Writer(Arc::clone(writer)),
            Stream::Buffer(buffer) => Stream::Buffer(Arc::clone(buffer)),
        })
    }

    /// Returns a process input reading from this stream.
    pub fn input(&mut self) -> Result<Input, StreamError> {
        match self {
            Stream::Inherit => Ok(Input::Direct(Stdio::inherit())),
            Stream::Null => Ok(Input::Direct(Stdio::null())),
            Stream::Bytes(bytes) => Ok(Input::Feed(Box::new(Cursor::new(bytes.clone())))),
            Stream::Pipe((reader, _)) => Ok(Input::Direct(Stdio::from(
                reader.try_clone().map_err(StreamError::CloneFailed)?,
            ))),
            Stream::FileHandle(file) => Ok(Input::Direct(Stdio::from(
                file.try_clone().map_err(StreamError::CloneFailed)?,
            ))),
            Stream::File(path) => {
                let file = File::open(&path)
                    .map_err(|error| StreamError::FileNotReadable(path.clone(), error))?;
                let handle = file.try_clone().map_err(StreamError::CloneFailed)?;
                *self = Stream::FileHandle(handle);
                Ok(Input::Direct(Stdio::from(file)))
            }
            Stream::Reader(reader) => Ok(Input::Feed(Box::new(SharedReader(Arc::clone(reader))))),
            Stream::AppendFile(_) | Stream::Writer(_) | Stream::Buffer(_) => {
                Err(StreamError::UnusableForInput)
            }
        }
    }

    /// Returns a process output writing to this stream.
    pub fn output(&mut self) -> Result<Output, StreamError> {
        match self {
            Stream::Inherit => Ok(Output::Direct(Stdio::inherit())),
            Stream::Null => Ok(Output::Direct(Stdio::null())),
            Stream::Pipe((_, writer)) => Ok(Output::Direct(Stdio::from(
                writer.try_clone().map_err(StreamError::CloneFailed)?,
            ))),
            Stream::FileHandle(file) => Ok(Output::Direct(Stdio::from(
                file.try_clone().map_err(StreamError::CloneFailed)?,
            ))),
            Stream::File(path) => {
                let file = File::create(&path)
                    .map_err(|error| StreamError::FileNotWritable(path.clone(), error))?;
                self.replace_with_handle(file)
            }
            Stream::AppendFile(path) => {
                let file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&path)
                    .map_err(|error| StreamError::FileNotWritable(path.clone(), error))?;
                self.replace_with_handle(file)
            }
            Stream::Writer(writer) => Ok(Output::Sink(Box::new(SharedWriter(Arc::clone(writer))))),
            Stream::Buffer(buffer) => Ok(Output::Sink(Box::new(SharedWriter(Arc::clone(buffer))))),
            Stream::Bytes(_) | Stream::Reader(_) => Err(StreamError::UnusableForOutput),
        }
    }

    /// Returns a writer for the stream.
    ///
    /// [`Stream::Inherit`] is treated as the current process' standard error.
    pub fn diagnostic_writer(&mut self) -> Result<Box<dyn Write + Send>, StreamError> {
        match self {
            Stream::Inherit => Ok(Box::new(io::stderr())),
            Stream::Null => Ok(Box::new(io::sink())),
            Stream::Pipe((_, writer)) => Ok(Box::new(
                writer.try_clone().map_err(StreamError::CloneFailed)?,
            )),
            Stream::FileHandle(file) => Ok(Box::new(
                file.try_clone().map_err(StreamError::CloneFailed)?,
            )),
            Stream::File(_) | Stream::AppendFile(_) => {
                self.output()?; // Opens the file.
                self.diagnostic_writer()
            }
            Stream::Writer(writer) => Ok(Box::new(SharedWriter(Arc::clone(writer)))),
            Stream::Buffer(buffer) => Ok(Box::new(SharedWriter(Arc::clone(buffer)))),
            Stream::Bytes(_) | Stream::Reader(_) => Err(StreamError::UnusableForOutput),
        }
    }

    fn replace_with_handle(&mut self, file: File) -> Result<Output, StreamError> {
        let handle = file.try_clone().map_err(StreamError::CloneFailed)?;
        *self = Stream::FileHandle(handle);
        Ok(Output::Direct(Stdio::from(file)))
    }
}

impl Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::Inherit => write!(f, "Inherit"),
            Stream::Null => write!(f, "Null"),
            Stream::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Stream::Pipe(_) => write!(f, "Pipe"),
            Stream::FileHandle(file) => f.debug_tuple("FileHandle").field(file).finish(),
            Stream::File(path) => f.debug_tuple("File").field(path).finish(),
            Stream::AppendFile(path) => f.debug_tuple("AppendFile").field(path).finish(),
            Stream::Reader(_) => write!(f, "Reader"),
            Stream::Writer(_) => write!(f, "Writer"),
            Stream::Buffer(buffer) => write!(f, "Buffer({} bytes)", buffer.lock().len()),
        }
    }
}

/// A reader that can be shared between threads.
struct SharedReader<R: ?Sized>(Arc<Mutex<R>>);

impl<R: Read + ?Sized> Read for SharedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().read(buf)
    }
}

/// A writer that can be shared between threads.
struct SharedWriter<W: ?Sized>(Arc<Mutex<W>>);

impl<W: Write + ?Sized> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek};

    use super::*;

    fn read_input(input: Input) -> String {
        match input {
            Input::Feed(mut reader) => {
                let mut contents = String::new();
                reader.read_to_string(&mut contents).unwrap();
                contents
            }
            Input::Direct(_) => panic!("expected a feed"),
        }
    }

    #[test]
    fn bytes_can_be_read_repeatedly() {
        let mut stream = Stream::Bytes(b"hello".to_vec());
        assert_eq!(read_input(stream.input().unwrap()), "hello");
        assert_eq!(read_input(stream.input().unwrap()), "hello");
    }

    #[test]
    fn reader_is_consumed() {
        let mut stream = Stream::reader(Cursor::new(b"once".to_vec()));
        assert_eq!(read_input(stream.input().unwrap()), "once");
        assert_eq!(read_input(stream.input().unwrap()), "");
    }

    #[test]
    fn buffer_collects_sink_writes() {
        let mut stream = Stream::buffer();
        let clone = stream.try_clone().unwrap();
        for text in ["a", "b"] {
            match stream.output().unwrap() {
                Output::Sink(mut sink) => sink.write_all(text.as_bytes()).unwrap(),
                Output::Direct(_) => panic!("expected a sink"),
            }
        }

        assert_eq!(clone.take_buffer(), Some(b"ab".to_vec()));
        assert_eq!(stream.take_buffer(), Some(Vec::new()));
    }

    #[test]
    fn direction_is_checked() {
        assert!(matches!(
            Stream::buffer().input(),
            Err(StreamError::UnusableForInput)
        ));
        assert!(matches!(
            Stream::Bytes(Vec::new()).output(),
            Err(StreamError::UnusableForOutput)
        ));
        assert!(matches!(
            Stream::AppendFile("/dev/null".into()).input(),
            Err(StreamError::UnusableForInput)
        ));
    }

    #[test]
    fn file_is_opened_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut stream = Stream::File(path.clone());

        assert!(matches!(stream.output(), Ok(Output::Direct(_))));
        assert!(matches!(stream, Stream::FileHandle(_)));
        assert!(path.is_file());
    }

    #[test]
    fn missing_file_is_not_readable() {
        let dir = tempfile::tempdir().unwrap();
        let mut stream = Stream::File(dir.path().join("missing"));
        assert!(matches!(
            stream.input(),
            Err(StreamError::FileNotReadable(_, _))
        ));
    }

    #[test]
    fn pipe_connects_writer_to_reader() {
        let mut stream = Stream::Pipe(os_pipe::pipe().unwrap());
        let mut writer = stream.diagnostic_writer().unwrap();
        writer.write_all(b"piped").unwrap();
        drop(writer);

        let mut reader = match &stream {
            Stream::Pipe((reader, _)) => reader.try_clone().unwrap(),
            _ => unreachable!(),
        };
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"piped");
        assert!(matches!(stream.input(), Ok(Input::Direct(_))));
    }

    #[test]
    fn diagnostic_writer_writes_to_file() {
        let mut file = tempfile::tempfile().unwrap();
        let mut stream = Stream::FileHandle(file.try_clone().unwrap());
        stream
            .diagnostic_writer()
            .unwrap()
            .write_all(b"diagnostic")
            .unwrap();

        let mut contents = String::new();
        file.rewind().unwrap();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "diagnostic");
    }
}
