pub mod http;
mod wire;
