pub mod beat;
pub mod tempo_map;
pub mod timing;
