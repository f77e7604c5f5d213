//! Album queue.
//!
//! An ordered list of an album's tracks plus the position of the one
//! playing. Moving skips tracks that have nothing to stream.

use core_library::models::{Album, Track};

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumQueue {
    album: Album,
    tracks: Vec<Track>,
    index: usize,
}

impl AlbumQueue {
    /// `None` if `index` is out of range.
    pub fn new(album: Album, tracks: Vec<Track>, index: usize) -> Option<Self> {
        (index < tracks.len()).then_some(Self {
            album,
            tracks,
            index,
        })
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.index)
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Index of the next playable track after the current one.
    pub fn next_index(&self) -> Option<usize> {
        (self.index + 1..self.tracks.len()).find(|&i| self.tracks[i].playable_url().is_some())
    }

    /// Index of the closest playable track before the current one.
    pub fn previous_index(&self) -> Option<usize> {
        (0..self.index)
            .rev()
            .find(|&i| self.tracks[i].playable_url().is_some())
    }

    pub fn set_index(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.index = index;
        }
    }
}
