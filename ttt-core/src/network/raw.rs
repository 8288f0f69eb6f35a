//! `AF_PACKET` raw socket bound to one interface.
//!
//! The socket is opened non-blocking and registered with the tokio
//! reactor through [`AsyncFd`], so receive deadlines are plain
//! `tokio::time::timeout`s. Opening needs `CAP_NET_RAW`.

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::unix::AsyncFd;
use tracing::debug;

use crate::error::TttError;
use crate::mac::MacAddr;
use crate::network::link::{Captured, Direction, Link};

/// Largest frame we expect to read (standard MTU plus headers).
const RECV_BUFFER: usize = 2048;

pub struct RawLink {
    fd: AsyncFd<OwnedFd>,
    interface: String,
    ifindex: i32,
    mac: MacAddr,
}

impl RawLink {
    /// Open a packet socket on `interface` that sees every protocol.
    pub fn open(interface: &str) -> Result<Self, TttError> {
        let name = CString::new(interface)
            .map_err(|_| TttError::InterfaceNotFound(interface.to_string()))?;

        // SAFETY: `name` is a valid NUL-terminated string.
        let ifindex = unsafe { libc::if_nametoindex(name.as_ptr()) };
        if ifindex == 0 {
            return Err(TttError::InterfaceNotFound(interface.to_string()));
        }
        let ifindex = ifindex as i32;

        let protocol = (libc::ETH_P_ALL as u16).to_be() as i32;
        // SAFETY: plain socket(2) call; the result is checked below.
        let raw = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                protocol,
            )
        };
        if raw < 0 {
            return Err(TttError::Transport(io::Error::last_os_error()));
        }
        // SAFETY: `raw` is a freshly opened descriptor nobody else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as u16;
        addr.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
        addr.sll_ifindex = ifindex;
        // SAFETY: `addr` is a fully initialised sockaddr_ll of the size passed.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(TttError::Transport(io::Error::last_os_error()));
        }

        let mac = read_hw_addr(interface)?;
        // SAFETY: `fd` is an open socket owned by the `AsyncFd` from here on.
        let fd = unsafe { AsyncFd::register(fd) }.map_err(io::Error::from)?;
        debug!(interface, ifindex, %mac, "raw link open");

        Ok(Self {
            fd,
            interface: interface.to_string(),
            ifindex,
            mac,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn ifindex(&self) -> i32 {
        self.ifindex
    }
}

impl std::fmt::Debug for RawLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawLink")
            .field("interface", &self.interface)
            .field("ifindex", &self.ifindex)
            .field("mac", &format_args!("{}", self.mac))
            .finish()
    }
}

#[async_trait]
impl Link for RawLink {
    async fn send(&mut self, frame: &[u8]) -> Result<(), TttError> {
        loop {
            let mut guard = self.fd.writable().await?;
            let result = guard.try_io(|inner| {
                // SAFETY: `frame` is valid for `frame.len()` bytes.
                let n = unsafe {
                    libc::send(
                        inner.as_raw_fd(),
                        frame.as_ptr().cast(),
                        frame.len(),
                        0,
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(n as usize)
                }
            });
            match result {
                Ok(Ok(n)) if n == frame.len() => return Ok(()),
                Ok(Ok(n)) => {
                    return Err(TttError::Transport(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("short send: {n} of {} bytes", frame.len()),
                    )));
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&mut self) -> Result<Captured, TttError> {
        let mut buf = vec![0u8; RECV_BUFFER];
        loop {
            let mut guard = self.fd.readable().await?;
            let result = guard.try_io(|inner| {
                let mut from: libc::sockaddr_ll = unsafe { mem::zeroed() };
                let mut from_len = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
                // SAFETY: `buf` and `from` are valid for the lengths passed.
                let n = unsafe {
                    libc::recvfrom(
                        inner.as_raw_fd(),
                        buf.as_mut_ptr().cast(),
                        buf.len(),
                        0,
                        &mut from as *mut libc::sockaddr_ll as *mut libc::sockaddr,
                        &mut from_len,
                    )
                };
                if n < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok((n as usize, from.sll_pkttype))
                }
            });
            match result {
                Ok(Ok((n, pkttype))) => {
                    buf.truncate(n);
                    let direction = if pkttype == libc::PACKET_OUTGOING as u8 {
                        Direction::Outgoing
                    } else {
                        Direction::Incoming
                    };
                    return Ok(Captured {
                        data: Bytes::from(buf),
                        direction,
                    });
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => continue,
            }
        }
    }

    fn local_mac(&self) -> MacAddr {
        self.mac
    }
}

/// Read the interface's hardware address from sysfs.
fn read_hw_addr(interface: &str) -> Result<MacAddr, TttError> {
    let path = format!("/sys/class/net/{interface}/address");
    let text = std::fs::read_to_string(&path)?;
    text.trim().parse()
}
