use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, Pat, Type};

/// Time a navigation system or helper when the `perf_stats` feature is on.
///
/// The generated guard logs on drop when the body took longer than the
/// threshold (milliseconds, default 1). If the function takes a parameter
/// whose type mentions `NavTick`, the guard also logs every 100 ticks so
/// cheap systems still show up in the perf log.
///
/// ```ignore
/// #[profile]
/// pub fn step_goal_bounds(job: ResMut<GoalBoundsJob>, tick: Res<NavTick>) { /* ... */ }
///
/// #[profile(4)]
/// pub fn bake_surface(/* ... */) { /* ... */ }
/// ```
///
/// Without the feature the attribute leaves the function untouched apart
/// from an inert `cfg` block.
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = attr.to_string().trim().parse().unwrap_or(1);

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let label = sig.ident.to_string();

    let tick_ident = find_nav_tick_param(&input);

    let tick_field = match &tick_ident {
        Some(ident) => quote! { Some(#ident.0) },
        None => quote! { None },
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _nav_perf_guard = {
                struct NavPerfGuard {
                    label: &'static str,
                    started: std::time::Instant,
                    tick: Option<u64>,
                }
                impl Drop for NavPerfGuard {
                    fn drop(&mut self) {
                        let elapsed = self.started.elapsed();
                        let periodic = self.tick.map_or(false, |t| t % 100 == 0);
                        if elapsed.as_millis() > #threshold_ms || periodic {
                            bevy::prelude::info!("[PERF] {}: {:?}", self.label, elapsed);
                        }
                    }
                }
                NavPerfGuard {
                    label: #label,
                    started: std::time::Instant::now(),
                    tick: #tick_field,
                }
            };

            #block
        }
    };

    output.into()
}

/// Name of the first argument whose type refers to `NavTick`, if any.
fn find_nav_tick_param(input: &ItemFn) -> Option<Ident> {
    input.sig.inputs.iter().find_map(|arg| {
        let FnArg::Typed(pat_type) = arg else { return None };
        let Pat::Ident(pat_ident) = &*pat_type.pat else { return None };
        if mentions_nav_tick(&pat_type.ty) {
            Some(pat_ident.ident.clone())
        } else {
            None
        }
    })
}

fn mentions_nav_tick(ty: &Type) -> bool {
    quote!(#ty).to_string().contains("NavTick")
}
