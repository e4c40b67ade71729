use super::image_models::{GeneratedImage, GenerationRequest};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// How many recent generations keep working buttons.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// What a result message's buttons need to act on it later.
#[derive(Debug, Clone)]
pub struct CachedGeneration {
    pub request: GenerationRequest,
    pub image: GeneratedImage,
    pub requester_id: u64,
}

/// Bounded map from result message id to the generation behind it.
/// The oldest entry is evicted once capacity is reached.
pub struct GenerationCache {
    entries: DashMap<u64, CachedGeneration>,
    order: Mutex<VecDeque<u64>>,
    capacity: usize,
}

impl GenerationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, message_id: u64, generation: CachedGeneration) {
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        if self.entries.insert(message_id, generation).is_none() {
            order.push_back(message_id);
        }
        while order.len() > self.capacity {
            if let Some(old) = order.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    pub fn get(&self, message_id: u64) -> Option<CachedGeneration> {
        self.entries.get(&message_id).map(|e| e.clone())
    }

    pub fn remove(&self, message_id: u64) -> Option<CachedGeneration> {
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        order.retain(|id| *id != message_id);
        self.entries.remove(&message_id).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::image_models::{ImageBackend, ImageFormat};

    fn generation(prompt: &str) -> CachedGeneration {
        CachedGeneration {
            request: GenerationRequest {
                backend: ImageBackend::A1111,
                prompt: prompt.to_string(),
                negative_prompt: String::new(),
                width: 512,
                height: 512,
                steps: 20,
                cfg_scale: 7.0,
                sampler: "Euler a".to_string(),
                seed: None,
                model: None,
                nsfw: false,
                denoising_strength: 0.6,
                upscaler: "R-ESRGAN 4x+".to_string(),
                upscale_factor: 2.0,
            },
            image: GeneratedImage {
                bytes: vec![1, 2, 3],
                format: ImageFormat::Png,
                seed: Some(1),
                info: None,
            },
            requester_id: 42,
        }
    }

    #[test]
    fn test_evicts_oldest() {
        let cache = GenerationCache::new(2);
        cache.insert(1, generation("one"));
        cache.insert(2, generation("two"));
        cache.insert(3, generation("three"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(1).is_none());
        assert_eq!(cache.get(3).unwrap().request.prompt, "three");
    }

    #[test]
    fn test_reinsert_does_not_duplicate_order() {
        let cache = GenerationCache::new(2);
        cache.insert(1, generation("one"));
        cache.insert(1, generation("one again"));
        cache.insert(2, generation("two"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1).unwrap().request.prompt, "one again");
    }

    #[test]
    fn test_remove() {
        let cache = GenerationCache::new(4);
        cache.insert(5, generation("five"));
        assert!(cache.remove(5).is_some());
        assert!(cache.remove(5).is_none());
        assert_eq!(cache.len(), 0);
    }
}
