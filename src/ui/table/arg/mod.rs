pub mod max_width;
