use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, DeriveInput, Ident, LitChar, LitInt, LitStr, Token,
};

/// 器件类声明
///
/// ```ignore
/// #[derive(Device)]
/// #[device(letter = 'D', pins("anode", "cathode"))]
/// pub struct Diode {
///     pub name: String,
///     pub nodes: Vec<String>,
///     #[parameter(position = 0, key_parameter, coerce = "model")]
///     pub model: Option<ParameterValue>,
///     #[parameter(keyword = "m", coerce = "float")]
///     pub multiplier: Option<ParameterValue>,
///     #[parameter(flag = "off")]
///     pub off: bool,
/// }
/// ```
///
/// Struct level: `letter`, `name` (defaults to the struct name), `pins(..)`,
/// `optional_pins(..)`, `variadic_pins`, `open_keywords`, `merge_trailing`.
///
/// Field level: `position = N` with optional `key_parameter`, `keyword`
/// (`= "spice_name"`, the field name otherwise), `flag` (same), `coerce`,
/// `default`. The fields `name`, `nodes`, `overrides` and `raw` are copied
/// from the bound element.
#[proc_macro_derive(Device, attributes(device, parameter))]
pub fn device_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;

    let fields = match &input.data {
        syn::Data::Struct(data_struct) => &data_struct.fields,
        _ => panic!("Device can only be derived for structs"),
    };

    let mut class_name = LitStr::new(&struct_name.to_string(), struct_name.span());
    let mut letter: Option<LitChar> = None;
    let mut pins = Vec::new();
    let mut variadic_pins = false;
    let mut open_keywords = false;
    let mut merge_trailing = false;

    for attr in &input.attrs {
        if !attr.path().is_ident("device") {
            continue;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("letter") {
                letter = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("name") {
                class_name = meta.value()?.parse()?;
                return Ok(());
            }
            if meta.path.is_ident("pins") || meta.path.is_ident("optional_pins") {
                let optional = meta.path.is_ident("optional_pins");
                let content;
                syn::parenthesized!(content in meta.input);
                let names = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                pins.extend(names.into_iter().map(|name| (name, optional)));
                return Ok(());
            }
            if meta.path.is_ident("variadic_pins") {
                variadic_pins = true;
                return Ok(());
            }
            if meta.path.is_ident("open_keywords") {
                open_keywords = true;
                return Ok(());
            }
            if meta.path.is_ident("merge_trailing") {
                merge_trailing = true;
                return Ok(());
            }
            Err(meta.error("unsupported device attribute"))
        });
        if let Err(error) = parsed {
            return error.to_compile_error().into();
        }
    }

    let letter = letter.expect("must provide #[device(letter = ...)]");

    let pin_definitions = pins.iter().enumerate().map(|(position, (name, optional))| {
        quote! {
          PinDefinition { position: #position, name: #name, optional: #optional },
        }
    });

    let mut descriptors = Vec::new();
    let mut field_assignments = Vec::new();

    for field in fields {
        let field_name = field.ident.clone().expect("Device fields must be named");
        let attribute = field_name.to_string();

        match attribute.as_str() {
            "name" | "nodes" | "overrides" | "raw" => {
                field_assignments.push(quote! { #field_name: element.#field_name.clone(), });
                continue;
            }
            _ => {}
        }

        let is_bool = match &field.ty {
            syn::Type::Path(path) => path.path.is_ident("bool"),
            _ => false,
        };
        let is_option = match &field.ty {
            syn::Type::Path(path) => {
                path.path.leading_colon.is_none()
                    && path.path.segments.len() == 1
                    && path.path.segments[0].ident == "Option"
            }
            _ => false,
        };

        let mut position: Option<usize> = None;
        let mut key_parameter = false;
        let mut keyword: Option<LitStr> = None;
        let mut flag: Option<LitStr> = None;
        let mut coercion: Option<Ident> = None;
        let mut default: Option<LitStr> = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("parameter") {
                continue;
            }
            let parsed = attr.parse_nested_meta(|meta| {
                let spice_name = |meta: &syn::meta::ParseNestedMeta| -> syn::Result<LitStr> {
                    if meta.input.peek(Token![=]) {
                        meta.value()?.parse()
                    } else {
                        Ok(LitStr::new(&attribute, field_name.span()))
                    }
                };
                if meta.path.is_ident("position") {
                    let lit: LitInt = meta.value()?.parse()?;
                    position = Some(lit.base10_parse()?);
                    return Ok(());
                }
                if meta.path.is_ident("key_parameter") {
                    key_parameter = true;
                    return Ok(());
                }
                if meta.path.is_ident("keyword") {
                    keyword = Some(spice_name(&meta)?);
                    return Ok(());
                }
                if meta.path.is_ident("flag") {
                    flag = Some(spice_name(&meta)?);
                    return Ok(());
                }
                if meta.path.is_ident("coerce") {
                    let lit: LitStr = meta.value()?.parse()?;
                    coercion = Some(coercion_variant(&lit)?);
                    return Ok(());
                }
                if meta.path.is_ident("default") {
                    default = Some(meta.value()?.parse()?);
                    return Ok(());
                }
                Err(meta.error("unsupported parameter attribute"))
            });
            if let Err(error) = parsed {
                return error.to_compile_error().into();
            }
        }

        let kind = match (position, &keyword, &flag) {
            (Some(position), None, None) => quote! {
              ParameterKind::Positional { position: #position, key_parameter: #key_parameter }
            },
            (None, Some(spice_name), None) => quote! {
              ParameterKind::Keyword { spice_name: #spice_name }
            },
            (None, None, Some(spice_name)) => quote! {
              ParameterKind::Flag { spice_name: #spice_name }
            },
            _ => panic!(
                "field `{}' needs exactly one of `position', `keyword' or `flag'",
                attribute
            ),
        };

        let coercion = match (&flag, coercion) {
            (Some(_), _) => format_ident!("Bool"),
            (None, Some(coercion)) => coercion,
            (None, None) => panic!("must provide #[parameter(coerce = ...)] for `{}'", attribute),
        };
        let default = match &default {
            Some(text) => quote! { Some(#text) },
            None => quote! { None },
        };

        descriptors.push(quote! {
          ParameterDescriptor {
            attribute: #attribute,
            kind: #kind,
            coercion: Coercion::#coercion,
            default: #default,
          },
        });

        if is_bool {
            field_assignments.push(quote! { #field_name: element.flag(#attribute), });
        } else if is_option {
            field_assignments.push(quote! { #field_name: element.optional(#attribute), });
        } else {
            field_assignments.push(quote! { #field_name: element.required(#attribute)?, });
        }
    }

    let expanded = quote! {
      impl Device for #struct_name {
        fn class() -> &'static DeviceClass {
          static CLASS: DeviceClass = DeviceClass {
            name: #class_name,
            letter: #letter,
            pins: &[#(#pin_definitions)*],
            variadic_pins: #variadic_pins,
            parameters: &[#(#descriptors)*],
            open_keywords: #open_keywords,
            merge_trailing: #merge_trailing,
          };
          &CLASS
        }

        fn from_element(element: &Element) -> SpiceResult<Self> {
          let class = Self::class();
          if element.class.name != class.name {
            return Err(SpiceError::parameter(
              class.name,
              "class",
              element.reference(),
              format!("element is bound to {}", element.class.name),
            ));
          }
          Ok(#struct_name {
            #(#field_assignments)*
          })
        }
      }
    };

    expanded.into()
}

fn coercion_variant(lit: &LitStr) -> syn::Result<Ident> {
    let variant = match lit.value().as_str() {
        "float" => "Float",
        "int" => "Int",
        "bool" => "Bool",
        "text" => "Text",
        "expression" => "Expression",
        "model" => "Model",
        "element_name" => "ElementName",
        "float_pair" => "FloatPair",
        "float_triplet" => "FloatTriplet",
        "initial_state" => "InitialState",
        other => {
            return Err(syn::Error::new(
                lit.span(),
                format!("unknown coercion `{}'", other),
            ))
        }
    };
    Ok(format_ident!("{}", variant))
}
