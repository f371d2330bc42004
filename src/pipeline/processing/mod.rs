// Pipeline processing: flattening remote records into node fields

pub mod normalize;
