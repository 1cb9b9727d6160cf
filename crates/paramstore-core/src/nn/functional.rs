use super::ModuleError;
use crate::tensor::{DType, Shape, TensorData};

/// Applies a linear transformation to the input tensor using the given weight and bias.
///
/// ```math
/// y = x @ weight + [bias]
/// ```
///
/// # Arguments:
///
/// - `input` is the input tensor, ``[..., d_input]``.
/// - `weight` is the weight tensor, ``[d_input, d_output]``.
/// - `bias` is the bias tensor (optional), ``[d_output]``.
///
/// # Returns:
///
/// The transformed tensor, ``[..., d_output]``.
pub fn linear(
    input: &TensorData,
    weight: &TensorData,
    bias: Option<&TensorData>,
) -> Result<TensorData, ModuleError> {
    check_f32(input)?;
    check_f32(weight)?;

    let [d_input, d_output] = match weight.shape().dims.as_slice() {
        [d_input, d_output] => [*d_input, *d_output],
        _ => {
            return Err(ModuleError::InputShape {
                found: weight.shape().clone(),
                reason: "weight must be rank 2".to_string(),
            });
        }
    };

    if input.shape().last() != Some(d_input) {
        return Err(ModuleError::InputShape {
            found: input.shape().clone(),
            reason: format!("expected {d_input} input features"),
        });
    }

    let x = input.to_vec::<f32>()?;
    let w = weight.to_vec::<f32>()?;
    let b = match bias {
        Some(bias) => {
            check_f32(bias)?;
            if bias.shape().dims != [d_output] {
                return Err(ModuleError::InputShape {
                    found: bias.shape().clone(),
                    reason: format!("bias must have shape [{d_output}]"),
                });
            }
            Some(bias.to_vec::<f32>()?)
        }
        None => None,
    };

    let batch_dims = &input.shape().dims[..input.shape().num_dims() - 1];
    let rows = batch_dims.iter().product::<usize>();
    let mut output = vec![0.0f32; rows * d_output];

    for row in 0..rows {
        let x_row = &x[row * d_input..(row + 1) * d_input];
        let out_row = &mut output[row * d_output..(row + 1) * d_output];

        for (k, x_k) in x_row.iter().enumerate() {
            let w_row = &w[k * d_output..(k + 1) * d_output];
            for j in 0..d_output {
                out_row[j] += x_k * w_row[j];
            }
        }

        if let Some(b) = &b {
            for j in 0..d_output {
                out_row[j] += b[j];
            }
        }
    }

    let mut dims = input.shape().dims.clone();
    if let Some(last) = dims.last_mut() {
        *last = d_output;
    }

    Ok(TensorData::new(output, Shape::from(dims)))
}

/// Applies the rectified linear unit function element-wise:
///
/// `y = max(0, x)`
pub fn relu(input: &TensorData) -> Result<TensorData, ModuleError> {
    check_f32(input)?;

    let values = input
        .to_vec::<f32>()?
        .into_iter()
        .map(|v| v.max(0.0))
        .collect::<Vec<_>>();

    Ok(TensorData::new(values, input.shape().clone()))
}

fn check_f32(data: &TensorData) -> Result<(), ModuleError> {
    match data.dtype() {
        DType::F32 => Ok(()),
        other => Err(ModuleError::UnsupportedDType(other)),
    }
}
