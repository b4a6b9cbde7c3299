mod fs;


pub use fs::path_to_string;
