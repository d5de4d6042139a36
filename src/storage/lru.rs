use super::FrameId;
use std::collections::{HashMap, VecDeque};

/// Frame replacement policy. Every frame is in exactly one of three states:
/// free (never handed out since construction or eviction), pinned
/// (reference-counted, never victimised) or evictable (queued in FIFO order
/// of the unpin that emptied its pin count). Victims come from the free
/// queue first so a page the cache could still serve is never re-read.
pub struct LruReplacer {
    free_list: VecDeque<FrameId>,
    lru_list: VecDeque<FrameId>,
    pin_count: HashMap<FrameId, usize>,
}

impl LruReplacer {
    pub fn new(size: usize) -> Self {
        Self {
            free_list: (0..size).collect(),
            lru_list: VecDeque::new(),
            pin_count: HashMap::new(),
        }
    }

    /// Pick the frame to replace: the oldest free frame, then the oldest
    /// evictable one. The returned frame is pinned with count 1.
    pub fn victim(&mut self) -> Option<FrameId> {
        let frame_id = self
            .free_list
            .pop_front()
            .or_else(|| self.lru_list.pop_front())?;
        let prev = self.pin_count.insert(frame_id, 1);
        assert!(prev.is_none(), "frame {} victimised while pinned", frame_id);
        Some(frame_id)
    }

    /// Pin a frame so it cannot be victimised. Free and evictable frames
    /// get a count of 1, already pinned frames have theirs incremented.
    pub fn pin(&mut self, frame_id: FrameId) {
        if let Some(count) = self.pin_count.get_mut(&frame_id) {
            *count += 1;
            return;
        }
        if let Some(pos) = self.lru_list.iter().position(|&id| id == frame_id) {
            self.lru_list.remove(pos);
            self.pin_count.insert(frame_id, 1);
            return;
        }
        if let Some(pos) = self.free_list.iter().position(|&id| id == frame_id) {
            self.free_list.remove(pos);
            self.pin_count.insert(frame_id, 1);
        }
    }

    /// Drop one pin. A no-op for frames that are not pinned; when the count
    /// reaches zero the frame joins the back of the evictable queue.
    pub fn unpin(&mut self, frame_id: FrameId) {
        let count = match self.pin_count.get_mut(&frame_id) {
            Some(count) => count,
            None => return,
        };
        *count -= 1;
        if *count != 0 {
            return;
        }
        self.pin_count.remove(&frame_id);
        assert!(
            !self.lru_list.contains(&frame_id),
            "frame {} unpinned while already evictable",
            frame_id
        );
        self.lru_list.push_back(frame_id);
    }

    /// Number of frames that can currently be victimised.
    pub fn size(&self) -> usize {
        self.free_list.len() + self.lru_list.len()
    }
}
