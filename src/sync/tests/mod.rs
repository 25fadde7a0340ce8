mod classifier;
mod sequence;
mod timestamp;
