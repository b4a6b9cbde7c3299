mod state;
mod utils;
