use proc_macro::{TokenStream, TokenTree};

/// Runtime options accepted by `#[convoy::main]` and `#[convoy::test]`.
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    /// Value of `worker_threads = N`, if given.
    pub(crate) worker_threads: Option<usize>,
}

impl RuntimeArgs {
    /// Renders the `RuntimeBuilder` expression these options describe.
    pub(crate) fn builder(&self) -> String {
        let mut builder = String::from("::convoy::RuntimeBuilder::new()");

        if let Some(n) = self.worker_threads {
            builder.push_str(&format!(".worker_threads({n})"));
        }

        builder.push_str(".build().expect(\"failed to build the convoy runtime\")");
        builder
    }
}

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Parses `key = value` attribute arguments.
///
/// Unknown keys are reported through the returned error message so the
/// caller can turn it into a `compile_error!`.
pub(crate) fn parse_runtime_args(attr: TokenStream) -> Result<RuntimeArgs, String> {
    let mut args = RuntimeArgs::default();

    for arg in split_args(attr) {
        let [TokenTree::Ident(key), TokenTree::Punct(eq), TokenTree::Literal(value)] =
            arg.as_slice()
        else {
            return Err("expected `key = value`".to_string());
        };

        if eq.as_char() != '=' {
            return Err(format!("expected `=` after `{key}`"));
        }

        match key.to_string().as_str() {
            "worker_threads" => {
                let n = value
                    .to_string()
                    .parse::<usize>()
                    .map_err(|_| "`worker_threads` must be an integer literal".to_string())?;

                if n == 0 {
                    return Err("`worker_threads` must be > 0".to_string());
                }

                args.worker_threads = Some(n);
            }
            other => return Err(format!("unknown runtime option `{other}`")),
        }
    }

    Ok(args)
}

/// Replaces the body of an `async fn` with `body`, dropping the `async`
/// keyword.
///
/// `wrap` receives the original body source and returns the new one.
/// Returns `None` if the item has no brace-delimited body.
pub(crate) fn rewrite_async_body(
    item: TokenStream,
    wrap: impl FnOnce(String) -> String,
) -> Option<Vec<TokenTree>> {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let pos = tokens.iter().rposition(
        |t| matches!(t, TokenTree::Group(g) if g.delimiter() == proc_macro::Delimiter::Brace),
    )?;

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => return None,
    };

    let body: TokenStream = wrap(block).parse().ok()?;

    tokens[pos] = TokenTree::Group(proc_macro::Group::new(
        proc_macro::Delimiter::Brace,
        body,
    ));

    Some(tokens)
}

/// Builds a `compile_error!` invocation carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}
