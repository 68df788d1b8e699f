// Test module for lexer
//
// This module contains unit tests for the Rill lexer.
// Tests are organized by category.

mod literal_tests;
mod token_tests;
