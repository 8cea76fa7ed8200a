pub mod helpers;

mod compiler_tests;
mod position_tests;
mod symbols_tests;
