pub mod ttl_lru;
