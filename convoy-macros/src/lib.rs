//! Attribute macros for the Convoy runtime.
//!
//! - `#[convoy::main]` turns an `async fn main` into a synchronous entry
//!   point that builds a runtime and blocks on the body.
//! - `#[convoy::test]` does the same for `#[test]` functions.
//!
//! Both accept `worker_threads = N`.

mod utils;

use proc_macro::{TokenStream, TokenTree};

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match utils::parse_runtime_args(attr) {
        Ok(args) => args,
        Err(msg) => return utils::compile_error(&format!("convoy::main: {msg}")),
    };

    let builder = args.builder();

    let Some(tokens) = utils::rewrite_async_body(item, |block| {
        format!(
            "{{
                let runtime = {builder};
                runtime
                    .block_on(async move {{
                        {block}
                    }})
            }}"
        )
    }) else {
        return utils::compile_error("convoy::main: expected an `async fn` with a body");
    };

    tokens.into_iter().collect()
}

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match utils::parse_runtime_args(attr) {
        Ok(args) => args,
        Err(msg) => return utils::compile_error(&format!("convoy::test: {msg}")),
    };

    let builder = args.builder();

    let Some(tokens) = utils::rewrite_async_body(item, |block| {
        format!(
            "{{
                let runtime = {builder};
                runtime
                    .block_on(async move {{ {block} }});
            }}"
        )
    }) else {
        return utils::compile_error("convoy::test: expected an `async fn` with a body");
    };

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
