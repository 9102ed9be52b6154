pub mod chat_api;
#[cfg(test)]
pub(crate) mod test_upstream;

pub use chat_api::ChatCompletionApi;
