pub mod text_generator_http;
