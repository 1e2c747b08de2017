//! Fixed parameters for a throughput session (window size, timeouts, redirects).

use std::time::Duration;

/// Bytes downloaded per candidate before the transfer is aborted (10 MiB).
pub const CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Per-request timeout in milliseconds.
pub const TIMEOUT_MS: u64 = 15_000;

/// Per-request timeout applied to every probe and download step.
pub const TIMEOUT: Duration = Duration::from_millis(TIMEOUT_MS);

/// Maximum number of redirects a single probe will follow.
pub const MAX_REDIRECTS: u32 = 3;

/// Redirect status codes the probe follows when a `Location` header is present.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Bits per decimal megabit. Throughput is reported in Mbps, not Mibps.
pub const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Large public ISO images served by mirrors that honor range requests.
pub const DEFAULT_CANDIDATE_URLS: &[&str] = &[
    "https://debian.c3sl.ufpr.br/debian-cd/12.11.0-live/amd64/iso-hybrid/debian-live-12.11.0-amd64-mate.iso",
    "https://mirrors.ic.unicamp.br/archlinux/iso/2025.06.01/archlinux-x86_64.iso",
    "http://ubuntu.linux.n0c.ca/ubuntu-cdimage/20.04/ubuntu-20.04.6-desktop-amd64.iso",
    "https://mint.c3sl.ufpr.br/stable/22.1/linuxmint-22.1-cinnamon-64bit.iso",
];
