//! Lowers a group of tail-recursive functions into a single loop.
//!
//! ```rust,ignore
//! tco! {
//!     pub fn fact(n: u32) -> u32 {
//!         fact_step(n, 1)
//!     }
//!
//!     fn fact_step(n: u32, acc: u32) -> u32 {
//!         if n <= 1 {
//!             acc
//!         } else {
//!             fact_step(n - 1, acc.wrapping_mul(n))
//!         }
//!     }
//! }
//! ```
//!
//! The first function is the public entry point, the rest are private
//! helpers. Every call between members of the group must be a tail call;
//! anything else is a compile error, so a group that expands at all runs
//! in constant stack space.

extern crate proc_macro;

use matches::matches;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::visit::{self, Visit};
use syn::visit_mut::{self, VisitMut};
use syn::{parse_quote, Error, Result};
use syn::{
    Block, Expr, ExprCall, ExprClosure, ExprMacro, FnArg, Ident, Item, ItemFn, Lifetime, Pat,
    ReturnType, Stmt, Type, Visibility,
};

struct Group {
    fns: Vec<ItemFn>,
}

impl Parse for Group {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut fns = vec![];
        while !input.is_empty() {
            fns.push(input.parse()?);
        }
        Ok(Group { fns })
    }
}

#[proc_macro]
pub fn tco(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    expand(input.into())
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

fn expand(input: TokenStream) -> Result<TokenStream> {
    let Group { fns } = syn::parse2(input)?;

    if fns.is_empty() {
        return Err(Error::new(
            Span::call_site(),
            "tco! needs at least one function definition",
        ));
    }

    let mut errors = fns.iter().filter_map(lint_fn).chain(lint_group(&fns));
    if let Some(mut first) = errors.next() {
        errors.for_each(|err| first.combine(err));
        return Err(first);
    }

    let group = Lowering::new(&fns);
    let entry = &fns[0].sig.ident;
    let frame_enum = &group.frame_enum;
    let driver = format_ident!("__tco_{}", entry);
    let output = output_type(&fns[0].sig.output);
    let frame = &group.frame;
    let label = &group.label;

    let variants = fns.iter().map(|fun| {
        let ident = &fun.sig.ident;
        let tys = typed_args(fun).map(|(_, ty)| ty);
        quote!(#ident(#(#tys),*))
    });

    let arms = fns
        .iter()
        .map(|fun| group.lower_fn(fun))
        .collect::<Result<Vec<_>>>()?;

    let entries = fns.iter().map(|fun| entry_fn(fun, frame_enum, &driver));

    Ok(quote! {
        #(#entries)*

        #[allow(non_camel_case_types, dead_code)]
        enum #frame_enum {
            #(#variants,)*
        }

        #[allow(unreachable_code, unused_labels)]
        fn #driver(mut #frame: #frame_enum) -> #output {
            #label: loop {
                #frame = match #frame {
                    #(#arms)*
                };
            }
        }
    })
}

fn lint_fn(fun: &ItemFn) -> Option<Error> {
    let sig = &fun.sig;
    if !sig.generics.params.is_empty() {
        Some(Error::new_spanned(
            &sig.generics.params,
            "generics are not supported for tail call optimization",
        ))
    } else if let Some(where_clause) = &sig.generics.where_clause {
        Some(Error::new_spanned(
            where_clause,
            "where clauses are not supported for tail call optimization",
        ))
    } else if let Some(variadic) = &sig.variadic {
        Some(Error::new_spanned(
            variadic,
            "variadic fn are not supported for tail call optimization",
        ))
    } else if let Some(abi) = &sig.abi {
        Some(Error::new_spanned(
            abi,
            "explicit ABIs are not supported for tail call optimization",
        ))
    } else if let Some(asyncness) = &sig.asyncness {
        Some(Error::new_spanned(
            asyncness,
            "async fn cannot be lowered to a loop",
        ))
    } else if let Some(constness) = &sig.constness {
        Some(Error::new_spanned(
            constness,
            "const fn is not supported for tail call optimization",
        ))
    } else if let Some(unsafety) = &sig.unsafety {
        Some(Error::new_spanned(
            unsafety,
            "unsafe fn is not supported for tail call optimization",
        ))
    } else {
        sig.inputs.iter().find_map(|arg| match arg {
            FnArg::Receiver(receiver) => Some(Error::new_spanned(
                receiver,
                "`self` argument not allowed here",
            )),
            FnArg::Typed(arg) => match &*arg.ty {
                Type::Reference(_) | Type::ImplTrait(_) => Some(Error::new_spanned(
                    &arg.ty,
                    "arguments must be owned values to be carried between iterations",
                )),
                _ => None,
            },
        })
    }
}

fn lint_group(fns: &[ItemFn]) -> Vec<Error> {
    let mut errors = vec![];

    if matches!(fns[0].vis, Visibility::Inherited) {
        errors.push(Error::new_spanned(
            &fns[0].sig.ident,
            "the first fn in tco!{} is the entry point and must be non-private",
        ));
    }
    for fun in fns.iter().skip(1) {
        if !matches!(fun.vis, Visibility::Inherited) {
            errors.push(Error::new_spanned(
                &fun.vis,
                "only the first fn in tco!{} may be non-private",
            ));
        }
    }

    let expected = output_type(&fns[0].sig.output).to_string();
    for fun in fns.iter().skip(1) {
        if output_type(&fun.sig.output).to_string() != expected {
            errors.push(Error::new_spanned(
                &fun.sig.output,
                format!("every fn in the group must return `{}`", expected),
            ));
        }
    }

    for (i, fun) in fns.iter().enumerate() {
        if fns[..i].iter().any(|seen| seen.sig.ident == fun.sig.ident) {
            errors.push(Error::new_spanned(
                &fun.sig.ident,
                format!("`{}` is defined more than once", fun.sig.ident),
            ));
        }
    }

    errors
}

fn output_type(output: &ReturnType) -> TokenStream {
    match output {
        ReturnType::Default => quote!(()),
        ReturnType::Type(_, ty) => quote!(#ty),
    }
}

fn typed_args(fun: &ItemFn) -> impl Iterator<Item = (&Pat, &Type)> {
    fun.sig.inputs.iter().filter_map(|arg| match arg {
        FnArg::Typed(arg) => Some((&*arg.pat, &*arg.ty)),
        FnArg::Receiver(_) => None,
    })
}

/// The public face of one group member: same attributes, visibility and
/// signature, seeding the driver with its own frame.
fn entry_fn(fun: &ItemFn, frame_enum: &Ident, driver: &Ident) -> TokenStream {
    let ItemFn { attrs, vis, sig, .. } = fun;
    let ident = &sig.ident;
    let output = &sig.output;

    let (names, tys): (Vec<Ident>, Vec<&Type>) = typed_args(fun)
        .enumerate()
        .map(|(i, (pat, ty))| match pat {
            Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                (pat.ident.clone(), ty)
            }
            _ => (format_ident!("__arg{}", i), ty),
        })
        .unzip();

    let allow = if matches!(vis, Visibility::Inherited) {
        quote!(#[allow(dead_code)])
    } else {
        quote!()
    };

    quote! {
        #(#attrs)*
        #allow
        #vis fn #ident(#(#names: #tys),*) #output {
            #driver(#frame_enum::#ident(#(#names),*))
        }
    }
}

struct Lowering {
    members: Vec<Ident>,
    frame_enum: Ident,
    frame: Ident,
    label: Lifetime,
}

impl Lowering {
    fn new(fns: &[ItemFn]) -> Self {
        Lowering {
            members: fns.iter().map(|fun| fun.sig.ident.clone()).collect(),
            frame_enum: format_ident!("__TcoFrame_{}", fns[0].sig.ident),
            frame: Ident::new("frame", Span::mixed_site()),
            label: Lifetime::new("'tco", Span::mixed_site()),
        }
    }

    /// `Some(frame)` if `expr` calls a member of the group.
    fn as_jump(&self, expr: &Expr) -> Option<Expr> {
        let call = match expr {
            Expr::Call(call) => call,
            _ => return None,
        };
        let callee = self.callee(call)?;
        let frame_enum = &self.frame_enum;
        let args = &call.args;
        Some(parse_quote!(#frame_enum::#callee(#args)))
    }

    fn callee<'a>(&self, call: &'a ExprCall) -> Option<&'a Ident> {
        match &*call.func {
            Expr::Path(func) if func.qself.is_none() => func
                .path
                .get_ident()
                .filter(|ident| self.members.contains(ident)),
            _ => None,
        }
    }

    /// One arm of the driver's `match`.
    fn lower_fn(&self, fun: &ItemFn) -> Result<TokenStream> {
        let frame_enum = &self.frame_enum;
        let ident = &fun.sig.ident;
        let pats = typed_args(fun).map(|(pat, _)| pat);

        let mut block = self.lower_block((*fun.block).clone());
        NestedReturns(self).visit_block_mut(&mut block);

        let mut stray = StrayCalls {
            lowering: self,
            found: None,
        };
        stray.visit_block(&block);
        if let Some(call) = stray.found {
            let callee = self.callee(call).map(Ident::to_string).unwrap_or_default();
            return Err(Error::new_spanned(
                call,
                format!(
                    "call to `{}` is not in tail position and cannot become a loop iteration",
                    callee
                ),
            ));
        }

        Ok(quote!(#frame_enum::#ident(#(#pats),*) => #block,))
    }

    fn lower_block(&self, mut block: Block) -> Block {
        match block.stmts.pop() {
            Some(Stmt::Expr(expr, None)) => {
                block.stmts.push(Stmt::Expr(self.lower_tail(expr), None));
            }
            Some(Stmt::Macro(mac)) if mac.semi_token.is_none() => {
                let expr = Expr::Macro(ExprMacro {
                    attrs: mac.attrs,
                    mac: mac.mac,
                });
                block.stmts.push(Stmt::Expr(self.lower_tail(expr), None));
            }
            Some(stmt) => {
                let returns = matches!(&stmt, Stmt::Expr(Expr::Return(_), Some(_)));
                block.stmts.push(stmt);
                if !returns {
                    block.stmts.push(Stmt::Expr(parse_quote!(return), None));
                }
            }
            None => block.stmts.push(Stmt::Expr(parse_quote!(return), None)),
        }
        block
    }

    /// Rewrite an expression in tail position so that it evaluates to the
    /// next frame, or returns from the driver when it yields a value.
    fn lower_tail(&self, expr: Expr) -> Expr {
        if let Some(jump) = self.as_jump(&expr) {
            return jump;
        }
        match expr {
            Expr::If(mut expr) => {
                expr.then_branch = self.lower_block(expr.then_branch);
                expr.else_branch = Some(match expr.else_branch.take() {
                    Some((else_token, branch)) => (else_token, Box::new(self.lower_tail(*branch))),
                    // only unit-typed `if` can omit its `else`
                    None => (Default::default(), Box::new(parse_quote!({ return }))),
                });
                Expr::If(expr)
            }
            Expr::Match(mut expr) => {
                for arm in &mut expr.arms {
                    let lowered = self.lower_tail((*arm.body).clone());
                    if !matches!(lowered, Expr::Block(_)) && arm.comma.is_none() {
                        arm.comma = Some(Default::default());
                    }
                    *arm.body = lowered;
                }
                Expr::Match(expr)
            }
            Expr::Block(mut expr) if expr.label.is_none() => {
                expr.block = self.lower_block(expr.block);
                Expr::Block(expr)
            }
            Expr::Paren(expr) => self.lower_tail(*expr.expr),
            Expr::Return(expr) => match expr.expr {
                Some(value) => self.lower_tail(*value),
                None => parse_quote!(return),
            },
            expr => parse_quote!(return #expr),
        }
    }
}

/// `return f(..)` anywhere in a body jumps to the next frame.
struct NestedReturns<'a>(&'a Lowering);

impl VisitMut for NestedReturns<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        let jump = match expr {
            Expr::Return(ret) => ret.expr.as_deref().and_then(|value| self.0.as_jump(value)),
            _ => None,
        };
        match jump {
            Some(next) => {
                let frame = &self.0.frame;
                let label = &self.0.label;
                *expr = parse_quote!({
                    #frame = #next;
                    continue #label;
                });
            }
            None => visit_mut::visit_expr_mut(self, expr),
        }
    }

    // `return` inside these belongs to something else
    fn visit_expr_closure_mut(&mut self, _: &mut ExprClosure) {}
    fn visit_expr_async_mut(&mut self, _: &mut syn::ExprAsync) {}
    fn visit_item_mut(&mut self, _: &mut Item) {}
}

struct StrayCalls<'a, 'ast> {
    lowering: &'a Lowering,
    found: Option<&'ast ExprCall>,
}

impl<'ast> Visit<'ast> for StrayCalls<'_, 'ast> {
    fn visit_expr_call(&mut self, call: &'ast ExprCall) {
        if self.found.is_some() {
            return;
        }
        if self.lowering.callee(call).is_some() {
            self.found = Some(call);
            return;
        }
        visit::visit_expr_call(self, call);
    }

    fn visit_item(&mut self, _: &'ast Item) {}
}
