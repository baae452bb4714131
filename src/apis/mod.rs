pub mod interpark;
