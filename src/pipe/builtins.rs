use crate::exception::{
    ConversionFailed, MethodArgumentNotValid, PropertyReference, TypeMismatch, simple_name,
};
use crate::pipe::{Pipe, PipeResult};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::str::FromStr;
use validator::Validate;

/// Runs `validator` on the input; failures become [`MethodArgumentNotValid`].
pub struct ValidationPipe<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ValidationPipe<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ValidationPipe<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Pipe for ValidationPipe<T>
where
    T: Validate + Send + 'static,
{
    type Input = T;
    type Output = T;

    async fn transform(&self, input: T) -> PipeResult<T> {
        input
            .validate()
            .map_err(|errors| MethodArgumentNotValid::from_validation::<T>(&errors))?;
        Ok(input)
    }
}

/// Parses a named raw parameter with `FromStr`; failures become [`TypeMismatch`].
pub struct ParsePipe<T> {
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ParsePipe<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Pipe for ParsePipe<T>
where
    T: FromStr + Send + 'static,
{
    type Input = String;
    type Output = T;

    async fn transform(&self, input: String) -> PipeResult<T> {
        match input.parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => Err(TypeMismatch::new(self.name.clone())
                .with_value(input)
                .with_required_type(std::any::type_name::<T>())
                .into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

/// Parses `"property[,asc|desc]"` against the sortable properties of a type.
///
/// Unknown properties become [`PropertyReference`], unknown directions
/// [`ConversionFailed`].
pub struct SortPipe {
    type_name: String,
    allowed: Vec<String>,
}

impl SortPipe {
    pub fn new(type_name: impl Into<String>, allowed: &[&str]) -> Self {
        Self {
            type_name: type_name.into(),
            allowed: allowed.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn for_type<T: ?Sized>(allowed: &[&str]) -> Self {
        Self::new(simple_name(std::any::type_name::<T>()), allowed)
    }
}

#[async_trait]
impl Pipe for SortPipe {
    type Input = String;
    type Output = Sort;

    async fn transform(&self, input: String) -> PipeResult<Sort> {
        let mut parts = input.splitn(2, ',');
        let property = parts.next().unwrap_or_default().trim().to_string();
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => Direction::Asc,
            Some(d) if d == "asc" => Direction::Asc,
            Some(d) if d == "desc" => Direction::Desc,
            Some(d) => return Err(ConversionFailed::new::<str, Direction>(d).into()),
        };

        if !self.allowed.iter().any(|allowed| *allowed == property) {
            return Err(PropertyReference {
                property,
                type_name: self.type_name.clone(),
            }
            .into());
        }

        Ok(Sort {
            property,
            direction,
        })
    }
}
