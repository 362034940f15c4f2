//! FTP-backed [`RemoteStore`].

use std::io::Cursor;
use std::net::ToSocketAddrs;

use suppaftp::types::FileType;
use suppaftp::FtpStream;

use sitepush_core::config::FtpTarget;

use crate::error::SyncError;
use crate::remote::{RemoteError, RemoteStore};

/// A logged-in FTP control connection in binary transfer mode.
pub struct FtpStore {
    stream: FtpStream,
}

impl FtpStore {
    /// Dial `target` with its dial timeout and log in.
    ///
    /// The dial timeout is the only timeout applied; transfers rely on the
    /// socket defaults.
    pub fn connect(target: &FtpTarget) -> Result<Self, SyncError> {
        let address = target.address();
        tracing::debug!("connect to server {address}");

        let connect_err = |source: RemoteError| SyncError::Connect {
            address: address.clone(),
            source,
        };
        let socket = (target.host.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| connect_err(RemoteError::Io(e)))?
            .next()
            .ok_or_else(|| connect_err(RemoteError::Resolve(address.clone())))?;

        let mut stream = FtpStream::connect_timeout(socket, target.dial_timeout)
            .map_err(|e| connect_err(e.into()))?;

        let login_err = |source: RemoteError| SyncError::Login {
            username: target.username.clone(),
            source,
        };
        stream
            .login(target.username.as_str(), target.password.as_str())
            .map_err(|e| login_err(e.into()))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| login_err(e.into()))?;

        Ok(Self { stream })
    }
}

impl RemoteStore for FtpStore {
    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream.cwd(path)?;
        Ok(())
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream.mkdir(path)?;
        Ok(())
    }

    fn store(&mut self, path: &str, bytes: &[u8]) -> Result<(), RemoteError> {
        tracing::debug!("upload {} bytes to ftp file {path}", bytes.len());
        let mut reader = Cursor::new(bytes);
        self.stream.put_file(path, &mut reader)?;
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream.rm(path)?;
        Ok(())
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        Ok(self.stream.retr_as_buffer(path)?.into_inner())
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        self.stream.quit()?;
        Ok(())
    }
}
