//! Trait definitions for the upstream link services.
//!
//! The HTTP clients implement these traits, allowing the resolution
//! pipeline and the directory composer to be driven by mocks in tests.

use std::future::Future;

use crate::cast::types::CastedLink;
use crate::debrid::types::{
    AddedTorrent, DownloadItem, TorrentInfo, UnrestrictedLink,
};

/// A debrid service: turns torrents into direct-download links.
///
/// Torrent jobs are upstream-owned and ephemeral; callers are expected to
/// delete a job once a usable link has been extracted from it.
pub trait DebridService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Submit a magnet URI. Returns the upstream job identifier.
    fn add_magnet(
        &self,
        magnet: &str,
    ) -> impl Future<Output = Result<AddedTorrent, Self::Error>> + Send;

    /// Fetch the current state of a torrent job.
    fn torrent_info(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<TorrentInfo, Self::Error>> + Send;

    /// Select which files of the torrent to fetch. `files` is a comma
    /// separated list of file ids, or `"all"`.
    fn select_files(
        &self,
        id: &str,
        files: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Delete a torrent job from the upstream account.
    fn delete_torrent(&self, id: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Exchange a hoster link for a time-limited direct-download URL.
    /// `ip` is an optional routing hint: the public address of the caller
    /// the download will be served to.
    fn unrestrict(
        &self,
        link: &str,
        ip: Option<&str>,
    ) -> impl Future<Output = Result<UnrestrictedLink, Self::Error>> + Send;

    /// The account's most recently generated downloads, newest first.
    fn recent_downloads(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<DownloadItem>, Self::Error>> + Send;
}

/// The casted-links service: a remote catalog of links cast to the
/// user's account, keyed by content hash and IMDb id.
pub trait CastService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All links currently cast to the account.
    fn list_casted(&self)
        -> impl Future<Output = Result<Vec<CastedLink>, Self::Error>> + Send;

    /// Delete one casted link, identified by its content hash and IMDb id.
    fn delete_casted(
        &self,
        hash: &str,
        imdb_id: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
